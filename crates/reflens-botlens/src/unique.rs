//! Distinct reviewer listing.

use std::collections::BTreeSet;

use reflens_core::Review;

use crate::classify::MISSING_LOGINS;

/// Distinct reviewer logins, trimmed, lowercased, and sorted.
///
/// Reviews without a login are skipped, as are the `nan`, `none`, and
/// `null` spellings a missing login takes after a dataframe round trip.
///
/// # Examples
///
/// ```
/// use reflens_botlens::unique::unique_reviewers;
/// use reflens_core::Review;
///
/// let reviews = vec![
///     Review { user: Some("Renovate[bot]".into()), ..Review::default() },
///     Review { user: Some(" renovate[bot]".into()), ..Review::default() },
///     Review { user: Some("codecov[bot]".into()), ..Review::default() },
/// ];
/// assert_eq!(unique_reviewers(&reviews), vec!["codecov[bot]", "renovate[bot]"]);
/// ```
pub fn unique_reviewers(reviews: &[Review]) -> Vec<String> {
    reviews
        .iter()
        .filter_map(|r| r.user.as_deref())
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty() && !MISSING_LOGINS.contains(&u.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by(user: Option<&str>) -> Review {
        Review {
            user: user.map(str::to_string),
            ..Review::default()
        }
    }

    #[test]
    fn deduplicates_case_insensitively() {
        let reviews = vec![by(Some("Alice")), by(Some("alice ")), by(Some("ALICE"))];
        assert_eq!(unique_reviewers(&reviews), vec!["alice"]);
    }

    #[test]
    fn output_is_sorted() {
        let reviews = vec![by(Some("zed")), by(Some("amy")), by(Some("mo"))];
        assert_eq!(unique_reviewers(&reviews), vec!["amy", "mo", "zed"]);
    }

    #[test]
    fn skips_missing_and_blank_logins() {
        let reviews = vec![by(None), by(Some("   ")), by(Some("bob"))];
        assert_eq!(unique_reviewers(&reviews), vec!["bob"]);
    }

    #[test]
    fn skips_placeholder_logins() {
        let reviews = vec![by(Some("nan")), by(Some("None")), by(Some(" NULL ")), by(Some("carol"))];
        assert_eq!(unique_reviewers(&reviews), vec!["carol"]);
    }

    #[test]
    fn empty_input_gives_empty_list() {
        assert!(unique_reviewers(&[]).is_empty());
    }
}
