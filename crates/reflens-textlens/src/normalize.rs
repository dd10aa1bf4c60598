//! HTML-to-plain-text normalization.
//!
//! Decodes entities, turns `<br>` variants into line breaks, drops every
//! other tag, then collapses whitespace into single spaces.

use std::sync::LazyLock;

use regex::Regex;
use reflens_core::TagReplacement;

static BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("break pattern is valid"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Cleans free-form pull request and review text.
///
/// Normalization is idempotent: the output is already a fixed point, so
/// normalizing it again returns the same string.
///
/// # Examples
///
/// ```
/// use reflens_core::TagReplacement;
/// use reflens_textlens::Normalizer;
///
/// let strip = Normalizer::new(TagReplacement::Remove);
/// assert_eq!(strip.normalize(Some("re<b>factor</b>")), "refactor");
///
/// let spaced = Normalizer::new(TagReplacement::Space);
/// assert_eq!(spaced.normalize(Some("<p>one</p><p>two</p>")), "one two");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    tags: TagReplacement,
}

impl Normalizer {
    pub fn new(tags: TagReplacement) -> Self {
        Self { tags }
    }

    /// Normalize `text`, treating an absent value as empty.
    ///
    /// Never fails: `None` (a null cell or a non-text value) yields `""`.
    ///
    /// # Examples
    ///
    /// ```
    /// use reflens_textlens::Normalizer;
    ///
    /// let n = Normalizer::default();
    /// assert_eq!(n.normalize(None), "");
    /// assert_eq!(n.normalize(Some("  a &amp; b<br/>c  ")), "a & b c");
    /// ```
    pub fn normalize(&self, text: Option<&str>) -> String {
        let Some(text) = text else {
            return String::new();
        };

        // Each pass that changes the text strictly shortens it or replaces
        // non-space whitespace, so this reaches a fixed point.
        let mut current = self.clean_once(text);
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, text: &str) -> String {
        // HTML5 rules: legacy entities without `;`, windows-1252 numeric
        // references, and U+FFFD for invalid code points.
        let decoded = htmlize::unescape(text);
        let broken = BREAK_RE.replace_all(&decoded, "\n");
        let stripped = TAG_RE.replace_all(&broken, self.tags.replacement());
        let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
        collapsed.trim().to_string()
    }
}

/// Normalize with the default settings (tags removed).
///
/// # Examples
///
/// ```
/// use reflens_textlens::normalize;
///
/// assert_eq!(normalize(Some("<em>Refactor</em>\n\n  login")), "Refactor login");
/// assert_eq!(normalize(None), "");
/// ```
pub fn normalize(text: Option<&str>) -> String {
    Normalizer::default().normalize(text)
}
