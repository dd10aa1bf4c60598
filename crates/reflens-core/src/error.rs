use std::path::PathBuf;

/// Errors that can occur across the reflens pipeline.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use reflens_core::ReflensError;
///
/// let err = ReflensError::Config("no output directory".into());
/// assert!(err.to_string().contains("no output directory"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReflensError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single source location could not be read.
    #[error("could not read {location}: {message}")]
    Source {
        /// The location that was attempted.
        location: String,
        /// Why the read failed.
        message: String,
    },

    /// A source has no candidate locations at all.
    #[error("no locations configured for the {0} source")]
    #[diagnostic(help("add at least one path or URL under [sources] in .reflens.toml"))]
    NoSources(String),

    /// A required column is absent from a loaded table.
    #[error("column '{column}' not found in {table} table. Columns: [{}]", .available.join(", "))]
    #[diagnostic(help("check that the source points at the expected dataset table"))]
    MissingColumn {
        /// Table the column was looked up in.
        table: String,
        /// Name of the missing column.
        column: String,
        /// Columns that the table does have.
        available: Vec<String>,
    },

    /// Dataframe decoding, casting, or encoding failure.
    #[error("table error: {0}")]
    Table(String),

    /// HTTP download failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReflensError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = ReflensError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn missing_column_lists_available_columns() {
        let err = ReflensError::MissingColumn {
            table: "reviews".into(),
            column: "pr_id".into(),
            available: vec!["id".into(), "user".into()],
        };
        assert_eq!(
            err.to_string(),
            "column 'pr_id' not found in reviews table. Columns: [id, user]"
        );
    }

    #[test]
    fn source_error_names_location() {
        let err = ReflensError::Source {
            location: "hf://datasets/hao-li/AIDev/pr_reviews.parquet".into(),
            message: "404 Not Found".into(),
        };
        assert!(err.to_string().contains("pr_reviews.parquet"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = ReflensError::FileNotFound(PathBuf::from("/tmp/missing.csv"));
        assert!(err.to_string().contains("/tmp/missing.csv"));
    }
}
