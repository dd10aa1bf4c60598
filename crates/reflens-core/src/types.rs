use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A pull request as loaded from the pull-request table.
///
/// Only `title` and `body` are ever rewritten after loading (by text
/// normalization); everything else is passed through to the export.
///
/// # Examples
///
/// ```
/// use reflens_core::PullRequest;
///
/// let pr = PullRequest {
///     pr_id: 101,
///     repo_id: 7,
///     title: "Refactor login flow".into(),
///     ..PullRequest::default()
/// };
/// assert!(pr.body.is_empty());
/// assert_eq!(pr.number, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Dataset-wide pull request id.
    pub pr_id: i64,
    /// Id of the repository the pull request belongs to.
    pub repo_id: i64,
    /// Pull request title.
    pub title: String,
    /// Pull request description.
    pub body: String,
    /// Per-repository pull request number.
    pub number: Option<i64>,
    /// `open` / `closed`.
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    pub merged_at: Option<String>,
    /// Login of the pull request author.
    pub user: Option<String>,
    pub html_url: Option<String>,
    pub repo_url: Option<String>,
}

/// Repository metadata joined onto pull requests.
///
/// # Examples
///
/// ```
/// use reflens_core::Repository;
///
/// let repo = Repository {
///     id: 7,
///     full_name: Some("octo/widgets".into()),
///     language: Some("Rust".into()),
///     forks: Some(3),
///     stars: Some(120),
/// };
/// assert_eq!(repo.stars, Some(120));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository id, referenced by [`PullRequest::repo_id`].
    pub id: i64,
    /// `owner/name`.
    pub full_name: Option<String>,
    /// Primary language reported by GitHub.
    pub language: Option<String>,
    pub forks: Option<i64>,
    pub stars: Option<i64>,
}

/// A pull request inner-joined with its repository metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedPr {
    pub pull_request: PullRequest,
    pub repository: Repository,
}

impl JoinedPr {
    /// Shorthand for the wrapped pull request id.
    pub fn pr_id(&self) -> i64 {
        self.pull_request.pr_id
    }
}

/// A single code review submitted on a pull request.
///
/// `full_name` and `stars` carry the repository context of the reviewed
/// pull request once the review has been matched to a refactor PR.
///
/// # Examples
///
/// ```
/// use reflens_core::Review;
///
/// let review = Review {
///     pr_id: 101,
///     user: Some("dependabot[bot]".into()),
///     state: Some("APPROVED".into()),
///     ..Review::default()
/// };
/// assert_eq!(review.full_name, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Id of the reviewed pull request.
    pub pr_id: i64,
    /// Login of the reviewer.
    pub user: Option<String>,
    /// `APPROVED`, `COMMENTED`, `CHANGES_REQUESTED`, ...
    pub state: Option<String>,
    pub submitted_at: Option<String>,
    /// Review text, normalized once the review is matched.
    pub body: Option<String>,
    pub full_name: Option<String>,
    pub stars: Option<i64>,
}

/// How HTML tags are removed during text normalization.
///
/// # Examples
///
/// ```
/// use reflens_core::TagReplacement;
///
/// let mode: TagReplacement = "space".parse().unwrap();
/// assert_eq!(mode, TagReplacement::Space);
/// assert_eq!(TagReplacement::default(), TagReplacement::Remove);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagReplacement {
    /// Delete tags outright (`a<b>c` becomes `ac`).
    #[default]
    Remove,
    /// Replace each tag with a space (`a<b>c` becomes `a c`).
    Space,
}

impl TagReplacement {
    /// The string substituted for every matched tag.
    pub fn replacement(self) -> &'static str {
        match self {
            TagReplacement::Remove => "",
            TagReplacement::Space => " ",
        }
    }
}

impl fmt::Display for TagReplacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagReplacement::Remove => write!(f, "remove"),
            TagReplacement::Space => write!(f, "space"),
        }
    }
}

impl FromStr for TagReplacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove" => Ok(TagReplacement::Remove),
            "space" => Ok(TagReplacement::Space),
            other => Err(format!("unknown tag replacement: {other}")),
        }
    }
}

/// Output format for stage summaries.
///
/// # Examples
///
/// ```
/// use reflens_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// assert_eq!(fmt.to_string(), "json");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
