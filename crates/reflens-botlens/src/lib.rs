//! Reviewer classification: bots versus humans.
//!
//! Classifies review authors with a high-precision rule set (marker
//! substring, known logins, bot suffixes), splits review rows by reviewer
//! kind, and lists the distinct reviewers of a split.

pub mod classify;
pub mod split;
pub mod unique;

pub use classify::{is_bot, BotClassifier};
