//! Core types, configuration, and error handling for reflens.
//!
//! This crate provides the shared foundation used by all other reflens crates:
//! - [`ReflensError`]: unified error type using `thiserror`
//! - [`ReflensConfig`]: configuration loaded from `.reflens.toml`
//! - Shared records: [`PullRequest`], [`Repository`], [`JoinedPr`], [`Review`]

mod config;
mod error;
mod types;

pub use config::{BotConfig, OutputConfig, ReflensConfig, SourceConfig, TextConfig};
pub use error::ReflensError;
pub use types::{JoinedPr, OutputFormat, PullRequest, Repository, Review, TagReplacement};

/// A convenience `Result` type for reflens operations.
pub type Result<T> = std::result::Result<T, ReflensError>;
