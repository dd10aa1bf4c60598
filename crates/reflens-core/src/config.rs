use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReflensError;
use crate::Result;
use crate::types::TagReplacement;

/// Top-level configuration loaded from `.reflens.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use reflens_core::ReflensConfig;
///
/// let config = ReflensConfig::default();
/// assert_eq!(config.sources.pull_requests.len(), 2);
/// assert_eq!(config.output.dir.to_str(), Some("."));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReflensConfig {
    /// Dataset locations, each with an ordered fallback list.
    #[serde(default)]
    pub sources: SourceConfig,
    /// Where CSV files are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Text normalization settings.
    #[serde(default)]
    pub text: TextConfig,
    /// Additional bot-classification rules.
    #[serde(default)]
    pub bots: BotConfig,
}

impl ReflensConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReflensError::Io`] if the file cannot be read, or
    /// [`ReflensError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reflens_core::ReflensConfig;
    /// use std::path::Path;
    ///
    /// let config = ReflensConfig::from_file(Path::new(".reflens.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ReflensError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use reflens_core::ReflensConfig;
    ///
    /// let toml = r#"
    /// [output]
    /// dir = "out"
    /// "#;
    /// let config = ReflensConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.output.dir.to_str(), Some("out"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Ordered fallback lists for the three input tables.
///
/// A location is a local path, an `http(s)://` URL, or an
/// `hf://datasets/<owner>/<name>/<file>` Hugging Face reference.
///
/// # Examples
///
/// ```
/// use reflens_core::SourceConfig;
///
/// let config = SourceConfig::default();
/// assert!(config.reviews[0].ends_with("all_pr_reviews.parquet"));
/// assert_eq!(config.timeout_secs, 600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_pull_request_sources")]
    pub pull_requests: Vec<String>,
    #[serde(default = "default_repository_sources")]
    pub repositories: Vec<String>,
    #[serde(default = "default_review_sources")]
    pub reviews: Vec<String>,
    /// Per-download HTTP timeout in seconds (default: 600).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pull_request_sources() -> Vec<String> {
    vec![
        "hf://datasets/hao-li/AIDev/all_pull_request.parquet".into(),
        "hf://datasets/hao-li/AIDev/pull_request.parquet".into(),
    ]
}

fn default_repository_sources() -> Vec<String> {
    vec![
        "hf://datasets/hao-li/AIDev/all_repository.parquet".into(),
        "hf://datasets/hao-li/AIDev/repository.parquet".into(),
    ]
}

fn default_review_sources() -> Vec<String> {
    vec![
        "hf://datasets/hao-li/AIDev/all_pr_reviews.parquet".into(),
        "hf://datasets/hao-li/AIDev/pr_reviews.parquet".into(),
    ]
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pull_requests: default_pull_request_sources(),
            repositories: default_repository_sources(),
            reviews: default_review_sources(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives every CSV (default: current directory).
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Text normalization settings.
///
/// # Examples
///
/// ```
/// use reflens_core::{TagReplacement, TextConfig};
///
/// let config = TextConfig::default();
/// assert_eq!(config.tag_replacement, TagReplacement::Remove);
/// assert_eq!(config.review_tag_replacement, TagReplacement::Space);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Tag handling for pull request titles and bodies (default: remove).
    #[serde(default)]
    pub tag_replacement: TagReplacement,
    /// Tag handling for review bodies (default: space).
    #[serde(default = "default_review_tag_replacement")]
    pub review_tag_replacement: TagReplacement,
}

fn default_review_tag_replacement() -> TagReplacement {
    TagReplacement::Space
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            tag_replacement: TagReplacement::default(),
            review_tag_replacement: default_review_tag_replacement(),
        }
    }
}

/// Extra bot-classification rules layered on top of the built-in ones.
///
/// These only ever widen the bot set; built-in logins and suffixes always apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Additional exact logins (matched case-insensitively).
    #[serde(default)]
    pub extra_logins: Vec<String>,
    /// Additional username suffixes (e.g. `"-ci"`).
    #[serde(default)]
    pub extra_suffixes: Vec<String>,
}
