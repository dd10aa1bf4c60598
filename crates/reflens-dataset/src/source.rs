//! Source locations and fallback loading.
//!
//! A source is an ordered list of candidate locations for one table. The
//! first location that can be fetched and decoded wins; when every
//! candidate fails, the last error is returned.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reflens_core::{ReflensError, Result, SourceConfig};

use crate::table::Table;

const HF_SCHEME: &str = "hf://datasets/";
const HF_BASE_URL: &str = "https://huggingface.co/datasets";

/// Where a table lives.
///
/// # Examples
///
/// ```
/// use reflens_dataset::Location;
///
/// let loc = Location::parse("hf://datasets/hao-li/AIDev/pr_reviews.parquet").unwrap();
/// assert_eq!(
///     loc,
///     Location::Remote(
///         "https://huggingface.co/datasets/hao-li/AIDev/resolve/main/pr_reviews.parquet".into()
///     )
/// );
///
/// let local = Location::parse("data/reviews.csv").unwrap();
/// assert!(matches!(local, Location::Local(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file on disk.
    Local(PathBuf),
    /// An `http(s)://` URL (Hugging Face references are resolved to one).
    Remote(String),
}

impl Location {
    /// Parse a configured location string.
    ///
    /// # Errors
    ///
    /// Returns [`ReflensError::Config`] for empty input or malformed
    /// `hf://` references.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReflensError::Config("empty source location".into()));
        }
        if let Some(rest) = raw.strip_prefix(HF_SCHEME) {
            return resolve_hf(rest).map(Location::Remote);
        }
        if raw.starts_with("hf://") {
            return Err(ReflensError::Config(format!(
                "only Hugging Face dataset references are supported: {raw}"
            )));
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Location::Remote(raw.to_string()));
        }
        Ok(Location::Local(PathBuf::from(raw)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => write!(f, "{url}"),
        }
    }
}

// `<owner>/<name>[@revision]/<path>` -> resolve URL
fn resolve_hf(reference: &str) -> Result<String> {
    let mut parts = reference.splitn(3, '/');
    let (Some(owner), Some(name), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ReflensError::Config(format!(
            "expected hf://datasets/<owner>/<name>/<file>, got hf://datasets/{reference}"
        )));
    };
    if owner.is_empty() || name.is_empty() || path.is_empty() {
        return Err(ReflensError::Config(format!(
            "incomplete Hugging Face reference: hf://datasets/{reference}"
        )));
    }
    let (name, revision) = name.split_once('@').unwrap_or((name, "main"));
    Ok(format!("{HF_BASE_URL}/{owner}/{name}/resolve/{revision}/{path}"))
}

/// On-disk encoding of a table, chosen by file extension.
///
/// # Examples
///
/// ```
/// use reflens_dataset::SourceFormat;
///
/// assert_eq!(SourceFormat::detect("reviews.CSV"), SourceFormat::Csv);
/// assert_eq!(SourceFormat::detect("https://x/y.parquet?download=1"), SourceFormat::Parquet);
/// assert_eq!(SourceFormat::detect("no_extension"), SourceFormat::Parquet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Parquet,
    Csv,
}

impl SourceFormat {
    pub fn detect(location: &str) -> Self {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        let is_csv = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("txt"));
        if is_csv {
            SourceFormat::Csv
        } else {
            SourceFormat::Parquet
        }
    }

    fn decode(self, table: &str, bytes: Vec<u8>) -> Result<Table> {
        match self {
            SourceFormat::Parquet => Table::from_parquet_bytes(table, bytes),
            SourceFormat::Csv => Table::from_csv_bytes(table, bytes),
        }
    }
}

/// Read a local table file, choosing the decoder by extension.
///
/// # Errors
///
/// Returns [`ReflensError::FileNotFound`] if `path` does not exist, or a
/// [`ReflensError::Table`] decode error.
pub fn read_local(table: &str, path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(ReflensError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    SourceFormat::detect(&path.to_string_lossy()).decode(table, bytes)
}

/// Fetches tables from local paths, URLs, and Hugging Face datasets.
pub struct SourceLoader {
    http: reqwest::Client,
    hf_token: Option<String>,
}

impl SourceLoader {
    /// Create a loader with the configured HTTP timeout.
    ///
    /// Picks up `HF_TOKEN` from the environment for gated datasets.
    ///
    /// # Errors
    ///
    /// Returns [`ReflensError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("reflens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReflensError::Http(format!("failed to create HTTP client: {e}")))?;
        let hf_token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        Ok(Self { http, hf_token })
    }

    /// Load `table` from a single location.
    pub async fn load(&self, table: &str, raw: &str) -> Result<Table> {
        let format = SourceFormat::detect(raw);
        match Location::parse(raw)? {
            Location::Local(path) => read_local(table, &path),
            Location::Remote(url) => {
                let bytes = self.download(&url).await?;
                format.decode(table, bytes)
            }
        }
    }

    /// Try each location in order until one loads.
    ///
    /// # Errors
    ///
    /// Returns [`ReflensError::NoSources`] for an empty list, otherwise the
    /// error of the last location tried, wrapped as [`ReflensError::Source`].
    pub async fn read_first_available(
        &self,
        table: &str,
        locations: &[String],
    ) -> Result<Table> {
        let mut last_err = None;
        for location in locations {
            tracing::info!(table, %location, "trying to load");
            match self.load(table, location).await {
                Ok(loaded) => {
                    tracing::info!(table, %location, rows = loaded.height(), "loaded");
                    return Ok(loaded);
                }
                Err(e) => {
                    tracing::warn!(table, %location, error = %e, "could not read source");
                    last_err = Some(ReflensError::Source {
                        location: location.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ReflensError::NoSources(table.to_string())))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.hf_token {
            if url.starts_with(HF_BASE_URL) {
                request = request.bearer_auth(token);
            }
        }
        let response = request
            .send()
            .await
            .map_err(|e| ReflensError::Http(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReflensError::Http(format!("{url} returned {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReflensError::Http(format!("reading body of {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}
