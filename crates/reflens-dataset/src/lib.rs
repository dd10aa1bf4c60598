//! Dataset access and the refactor review pipeline stages.
//!
//! Loads the pull request, repository, and review tables from ordered
//! fallback sources, extracts typed records, joins and filters them, and
//! writes the resulting CSV files.

pub mod export;
pub mod records;
pub mod source;
pub mod stages;
pub mod table;

pub use source::{Location, SourceFormat, SourceLoader};
pub use table::Table;
