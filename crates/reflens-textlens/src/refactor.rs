//! Refactor mention detection.

use std::sync::LazyLock;

use regex::Regex;

// "re" and "factor" may be split by hyphens or whitespace; any word
// characters may follow ("refactored", "re-factoring", "refactor_x").
static REFACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bre[-\s]*factor\w*\b").expect("refactor pattern is valid"));

/// Returns `true` if `text` mentions refactoring.
///
/// Expects normalized text, but works on any input.
///
/// # Examples
///
/// ```
/// use reflens_textlens::is_refactor;
///
/// assert!(is_refactor("Refactor login flow"));
/// assert!(is_refactor("re-factoring tests"));
/// assert!(!is_refactor("fix factory defaults"));
/// ```
pub fn is_refactor(text: &str) -> bool {
    REFACTOR_RE.is_match(text)
}

/// Inclusion predicate for a pull request: title or body mentions refactoring.
///
/// # Examples
///
/// ```
/// use reflens_textlens::is_refactor_pr;
///
/// assert!(is_refactor_pr("Update deps", "Also refactored the loader."));
/// assert!(!is_refactor_pr("Update deps", ""));
/// ```
pub fn is_refactor_pr(title: &str, body: &str) -> bool {
    is_refactor(title) || is_refactor(body)
}
