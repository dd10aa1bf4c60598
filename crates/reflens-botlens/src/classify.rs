//! Rule-based bot detection on usernames.

use std::collections::HashSet;

use reflens_core::BotConfig;

/// Marker GitHub appends to app accounts (`dependabot[bot]`).
pub const BOT_MARKER: &str = "[bot]";

/// Known automation accounts, lowercase.
pub const KNOWN_BOT_LOGINS: &[&str] = &[
    // AI reviewers
    "copilot",
    "copilot-pull-request-reviewer[bot]",
    "copilot-swe-agent[bot]",
    "cursor[bot]",
    "gemini-code-assist[bot]",
    "coderabbitai[bot]",
    "ellipsis-dev[bot]",
    "greptile-apps[bot]",
    "entelligence-ai-pr-reviews[bot]",
    "github-advanced-security[bot]",
    // CI and dependency automation
    "github-actions[bot]",
    "dependabot[bot]",
    "dependabot[security]",
    "renovate[bot]",
    "mergify[bot]",
    "semantic-release-bot",
    "snyk-bot",
    "codecov[bot]",
    "vercel[bot]",
    "netlify[bot]",
    "circleci[bot]",
    "travis-ci",
    "azure-pipelines[bot]",
    "actions-user",
    "release-please[bot]",
    "automation-bot",
];

/// Username endings that mark an account as a bot.
pub const BOT_SUFFIXES: &[&str] = &["-bot", "_bot"];

// Spellings a missing login takes after passing through a dataframe.
pub(crate) const MISSING_LOGINS: &[&str] = &["nan", "none", "null"];

/// High-precision username classifier.
///
/// A username is a bot if, after trimming and lowercasing, it contains
/// [`BOT_MARKER`], equals a known bot login, or ends with a bot suffix.
///
/// # Examples
///
/// ```
/// use reflens_botlens::BotClassifier;
///
/// let classifier = BotClassifier::new();
/// assert!(classifier.is_bot(Some("Renovate[bot]")));
/// assert!(classifier.is_bot(Some("snyk-bot")));
/// assert!(!classifier.is_bot(Some("octocat")));
/// assert!(!classifier.is_bot(None));
/// ```
#[derive(Debug, Clone)]
pub struct BotClassifier {
    logins: HashSet<String>,
    suffixes: Vec<String>,
}

impl Default for BotClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BotClassifier {
    /// Classifier with the built-in login set and suffixes.
    pub fn new() -> Self {
        Self {
            logins: KNOWN_BOT_LOGINS.iter().map(|l| (*l).to_string()).collect(),
            suffixes: BOT_SUFFIXES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Built-in rules widened with the configured extra logins and suffixes.
    ///
    /// # Examples
    ///
    /// ```
    /// use reflens_botlens::BotClassifier;
    /// use reflens_core::BotConfig;
    ///
    /// let config = BotConfig {
    ///     extra_logins: vec!["Deploy-Keeper".into()],
    ///     extra_suffixes: vec!["-ci".into()],
    /// };
    /// let classifier = BotClassifier::from_config(&config);
    /// assert!(classifier.is_bot(Some("deploy-keeper")));
    /// assert!(classifier.is_bot(Some("nightly-ci")));
    /// assert!(classifier.is_bot(Some("dependabot[bot]")));
    /// ```
    pub fn from_config(config: &BotConfig) -> Self {
        let mut classifier = Self::new();
        classifier.logins.extend(
            config
                .extra_logins
                .iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty()),
        );
        for suffix in &config.extra_suffixes {
            let suffix = suffix.trim().to_lowercase();
            if !suffix.is_empty() && !classifier.suffixes.contains(&suffix) {
                classifier.suffixes.push(suffix);
            }
        }
        classifier
    }

    /// Returns `true` if `user` looks like an automation account.
    ///
    /// Empty, absent, and `nan`-like usernames are never bots.
    pub fn is_bot(&self, user: Option<&str>) -> bool {
        let Some(user) = user else {
            return false;
        };
        let login = user.trim().to_lowercase();
        if login.is_empty() || MISSING_LOGINS.contains(&login.as_str()) {
            return false;
        }

        login.contains(BOT_MARKER)
            || self.logins.contains(&login)
            || self.suffixes.iter().any(|s| login.ends_with(s.as_str()))
    }
}

/// Classify with the built-in rules only.
///
/// # Examples
///
/// ```
/// use reflens_botlens::is_bot;
///
/// assert!(is_bot(Some("dependabot[bot]")));
/// assert!(!is_bot(Some("")));
/// ```
pub fn is_bot(user: Option<&str>) -> bool {
    BotClassifier::new().is_bot(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_accounts_are_bots() {
        assert!(is_bot(Some("dependabot[bot]")));
        assert!(is_bot(Some(
            &"Copilot-Pull-Request-Reviewer[bot]".to_lowercase()
        )));
        assert!(is_bot(Some("some-new-app[bot]")));
        assert!(is_bot(Some("  Mixed-Case[BOT]  ")));
    }

    #[test]
    fn known_logins_match_case_insensitively() {
        assert!(is_bot(Some("Copilot")));
        assert!(is_bot(Some("TRAVIS-CI")));
        assert!(is_bot(Some("actions-user")));
        assert!(is_bot(Some("dependabot[security]")));
    }

    #[test]
    fn suffixes_mark_bots() {
        assert!(is_bot(Some("some-bot")));
        assert!(is_bot(Some("deploy_bot")));
        assert!(is_bot(Some("Release-Bot ")));
    }

    #[test]
    fn humans_are_not_bots() {
        for user in ["octocat", "robot99", "abbott", "bot", "botanist", "copilot-fan"] {
            assert!(!is_bot(Some(user)), "{user} misclassified as bot");
        }
    }

    #[test]
    fn missing_logins_are_not_bots() {
        assert!(!is_bot(None));
        assert!(!is_bot(Some("")));
        assert!(!is_bot(Some("   ")));
        assert!(!is_bot(Some("nan")));
        assert!(!is_bot(Some("NaN")));
        assert!(!is_bot(Some("None")));
    }

    #[test]
    fn extra_rules_only_widen() {
        let config = BotConfig {
            extra_logins: vec!["  Build-Runner ".into(), String::new()],
            extra_suffixes: vec!["-ci".into(), "-bot".into()],
        };
        let classifier = BotClassifier::from_config(&config);
        assert!(classifier.is_bot(Some("build-runner")));
        assert!(classifier.is_bot(Some("nightly-ci")));
        assert!(classifier.is_bot(Some("dependabot[bot]")));
        assert!(classifier.is_bot(Some("snyk-bot")));
        assert!(!classifier.is_bot(Some("octocat")));
        assert_eq!(
            classifier.suffixes.iter().filter(|s| s.as_str() == "-bot").count(),
            1
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = BotClassifier::new();
        for user in ["renovate[bot]", "octocat", "x_bot", ""] {
            assert_eq!(classifier.is_bot(Some(user)), classifier.is_bot(Some(user)));
        }
    }
}
