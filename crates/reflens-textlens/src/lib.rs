//! Text cleaning and refactor detection for pull request text.
//!
//! Normalizes HTML-laden titles and bodies into plain single-line text and
//! classifies pull requests whose text references refactoring.

pub mod normalize;
pub mod refactor;

pub use normalize::{normalize, Normalizer};
pub use refactor::{is_refactor, is_refactor_pr};
