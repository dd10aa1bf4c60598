//! Splitting review rows into human and bot reviewers.

use reflens_core::Review;
use serde::Serialize;

use crate::classify::BotClassifier;

/// A review annotated with the kind of account that submitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReview {
    pub review: Review,
    pub is_bot: bool,
}

/// Annotate every review with `is_bot`, preserving order.
pub fn classify_reviews(reviews: Vec<Review>, classifier: &BotClassifier) -> Vec<ClassifiedReview> {
    reviews
        .into_iter()
        .map(|review| {
            let is_bot = classifier.is_bot(review.user.as_deref());
            ClassifiedReview { review, is_bot }
        })
        .collect()
}

/// `is_bot` for each login, in order.
///
/// Callers holding rows in a table use this to partition them without
/// first converting each row into a [`Review`].
pub fn bot_mask<'a, I>(users: I, classifier: &BotClassifier) -> Vec<bool>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    users.into_iter().map(|user| classifier.is_bot(user)).collect()
}

/// Review rows partitioned by reviewer kind.
///
/// Rows are not de-duplicated: a reviewer with three reviews contributes
/// three rows to its side.
///
/// # Examples
///
/// ```
/// use reflens_botlens::split::ReviewerSplit;
/// use reflens_botlens::BotClassifier;
/// use reflens_core::Review;
///
/// let reviews = vec![
///     Review { pr_id: 1, user: Some("octocat".into()), ..Review::default() },
///     Review { pr_id: 1, user: Some("coderabbitai[bot]".into()), ..Review::default() },
///     Review { pr_id: 2, user: None, ..Review::default() },
/// ];
/// let split = ReviewerSplit::new(reviews, &BotClassifier::new());
/// assert_eq!(split.humans.len(), 2);
/// assert_eq!(split.bots.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReviewerSplit {
    pub humans: Vec<Review>,
    pub bots: Vec<Review>,
}

impl ReviewerSplit {
    pub fn new(reviews: Vec<Review>, classifier: &BotClassifier) -> Self {
        let mut split = Self::default();
        for classified in classify_reviews(reviews, classifier) {
            if classified.is_bot {
                split.bots.push(classified.review);
            } else {
                split.humans.push(classified.review);
            }
        }
        tracing::debug!(
            humans = split.humans.len(),
            bots = split.bots.len(),
            "classified review rows"
        );
        split
    }

    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            human_rows: self.humans.len(),
            bot_rows: self.bots.len(),
        }
    }
}

/// Row counts of a [`ReviewerSplit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSummary {
    pub human_rows: usize,
    pub bot_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(pr_id: i64, user: Option<&str>) -> Review {
        Review {
            pr_id,
            user: user.map(str::to_string),
            ..Review::default()
        }
    }

    #[test]
    fn classify_preserves_order_and_flags_bots() {
        let classified = classify_reviews(
            vec![
                review(1, Some("github-actions[bot]")),
                review(2, Some("alice")),
                review(3, Some("deploy_bot")),
            ],
            &BotClassifier::new(),
        );
        let flags: Vec<_> = classified.iter().map(|c| (c.review.pr_id, c.is_bot)).collect();
        assert_eq!(flags, vec![(1, true), (2, false), (3, true)]);
    }

    #[test]
    fn bot_mask_matches_classifier() {
        let users = [Some("alice"), None, Some("Dependabot[bot]"), Some("nan"), Some("x-bot")];
        assert_eq!(
            bot_mask(users, &BotClassifier::new()),
            vec![false, false, true, false, true]
        );
    }

    #[test]
    fn split_keeps_duplicate_rows() {
        let reviews = vec![
            review(1, Some("alice")),
            review(2, Some("alice")),
            review(2, Some("dependabot[bot]")),
            review(3, Some("dependabot[bot]")),
        ];
        let split = ReviewerSplit::new(reviews, &BotClassifier::new());
        assert_eq!(
            split.summary(),
            SplitSummary {
                human_rows: 2,
                bot_rows: 2
            }
        );
    }

    #[test]
    fn split_partitions_every_row() {
        let reviews: Vec<_> = (0..20)
            .map(|i| {
                let user = if i % 3 == 0 { "ci_bot" } else { "human" };
                review(i, Some(user))
            })
            .collect();
        let total = reviews.len();
        let split = ReviewerSplit::new(reviews, &BotClassifier::new());
        assert_eq!(split.humans.len() + split.bots.len(), total);
        assert!(split.bots.iter().all(|r| r.user.as_deref() == Some("ci_bot")));
    }

    #[test]
    fn missing_users_count_as_humans() {
        let split = ReviewerSplit::new(vec![review(1, None)], &BotClassifier::new());
        assert_eq!(split.humans.len(), 1);
        assert!(split.bots.is_empty());
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = SplitSummary {
            human_rows: 4,
            bot_rows: 1,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["humanRows"], 4);
        assert_eq!(json["botRows"], 1);
    }
}
