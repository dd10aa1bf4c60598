//! CSV export.
//!
//! Files are UTF-8 with a byte-order mark, comma separated, quoted only
//! where needed, with `\n` line endings and a header row.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use reflens_core::{JoinedPr, Result, Review};

use crate::table::{table_error, Table};

pub const REFACTOR_PRS_FILE: &str = "AIDev_all_refactor_PRs.csv";
pub const REVIEWS_FILE: &str = "AIDev_all_refactor_PR_reviews.csv";
pub const HUMAN_REVIEWS_FILE: &str = "AIDev_pop_refactor_reviewers_humans.csv";
pub const BOT_REVIEWS_FILE: &str = "AIDev_pop_refactor_reviewers_bots.csv";
pub const UNIQUE_BOTS_FILE: &str = "unique_bots_reviewers.txt";

/// Preferred column order for the refactor PR export.
pub const PR_COLUMNS: &[&str] = &[
    "pr_id",
    "number",
    "title",
    "state",
    "created_at",
    "closed_at",
    "merged_at",
    "user",
    "repo_id",
    "full_name",
    "language",
    "forks",
    "stars",
    "html_url",
    "repo_url",
];

/// Preferred column order for every review export.
pub const REVIEW_COLUMNS: &[&str] = &[
    "pr_id",
    "user",
    "state",
    "submitted_at",
    "full_name",
    "stars",
    "body",
];

/// A single CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(Option<i64>),
    Text(Option<String>),
}

/// A record that can be written as one CSV row.
pub trait CsvRecord {
    /// Value of `column`, or `None` if the record has no such column.
    fn cell(&self, column: &str) -> Option<Cell>;
}

impl CsvRecord for JoinedPr {
    fn cell(&self, column: &str) -> Option<Cell> {
        let pr = &self.pull_request;
        let repo = &self.repository;
        let cell = match column {
            "pr_id" => Cell::Int(Some(pr.pr_id)),
            "number" => Cell::Int(pr.number),
            "title" => Cell::Text(Some(pr.title.clone())),
            "body" => Cell::Text(Some(pr.body.clone())),
            "state" => Cell::Text(pr.state.clone()),
            "created_at" => Cell::Text(pr.created_at.clone()),
            "closed_at" => Cell::Text(pr.closed_at.clone()),
            "merged_at" => Cell::Text(pr.merged_at.clone()),
            "user" => Cell::Text(pr.user.clone()),
            "repo_id" => Cell::Int(Some(pr.repo_id)),
            "full_name" => Cell::Text(repo.full_name.clone()),
            "language" => Cell::Text(repo.language.clone()),
            "forks" => Cell::Int(repo.forks),
            "stars" => Cell::Int(repo.stars),
            "html_url" => Cell::Text(pr.html_url.clone()),
            "repo_url" => Cell::Text(pr.repo_url.clone()),
            _ => return None,
        };
        Some(cell)
    }
}

impl CsvRecord for Review {
    fn cell(&self, column: &str) -> Option<Cell> {
        let cell = match column {
            "pr_id" => Cell::Int(Some(self.pr_id)),
            "user" => Cell::Text(self.user.clone()),
            "state" => Cell::Text(self.state.clone()),
            "submitted_at" => Cell::Text(self.submitted_at.clone()),
            "full_name" => Cell::Text(self.full_name.clone()),
            "stars" => Cell::Int(self.stars),
            "body" => Cell::Text(self.body.clone()),
            _ => return None,
        };
        Some(cell)
    }
}

/// Columns of `preferred` that are in `present`, keeping preferred order.
///
/// # Examples
///
/// ```
/// use reflens_dataset::export::select_columns;
///
/// let present = vec!["body".to_string(), "pr_id".to_string()];
/// assert_eq!(select_columns(&["pr_id", "user", "body"], &present), vec!["pr_id", "body"]);
/// ```
pub fn select_columns(preferred: &[&'static str], present: &[String]) -> Vec<&'static str> {
    preferred
        .iter()
        .copied()
        .filter(|c| present.iter().any(|p| p == c))
        .collect()
}

/// Write `rows` to `path` with the given columns.
///
/// A column is written as integers when its first non-null cell is an
/// integer, and as text otherwise.
///
/// # Errors
///
/// Returns [`ReflensError::Io`](reflens_core::ReflensError::Io) if the file cannot be created, or
/// [`ReflensError::Table`](reflens_core::ReflensError::Table) if encoding fails.
pub fn write_csv<R: CsvRecord>(path: &Path, columns: &[&str], rows: &[R]) -> Result<()> {
    let mut frame_columns = Vec::with_capacity(columns.len());
    for &name in columns {
        let cells: Vec<Cell> = rows
            .iter()
            .map(|r| r.cell(name).unwrap_or(Cell::Text(None)))
            .collect();
        frame_columns.push(build_column(name, cells));
    }
    let mut frame = DataFrame::new(frame_columns).map_err(table_error)?;
    write_frame(path, &mut frame)
}

/// Write a single text column (e.g. a reviewer list) to `path`.
pub fn write_list(path: &Path, header: &str, values: &[String]) -> Result<()> {
    let column = Column::new(header.into(), values.to_vec());
    let mut frame = DataFrame::new(vec![column]).map_err(table_error)?;
    write_frame(path, &mut frame)
}

/// Write the given columns of a loaded table to `path`, values as read.
pub fn write_table(path: &Path, table: &Table, columns: &[&str]) -> Result<()> {
    let mut frame = table
        .frame()
        .select(columns.iter().copied())
        .map_err(table_error)?;
    write_frame(path, &mut frame)
}

fn build_column(name: &str, cells: Vec<Cell>) -> Column {
    let integral = cells
        .iter()
        .find_map(|c| match c {
            Cell::Int(Some(_)) => Some(true),
            Cell::Text(Some(_)) => Some(false),
            _ => None,
        })
        .unwrap_or(matches!(cells.first(), Some(Cell::Int(_))));

    if integral {
        let values: Vec<Option<i64>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => v,
                Cell::Text(v) => v.and_then(|s| s.parse().ok()),
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(v) => v.map(|i| i.to_string()),
                // polars quotes empty strings; a null is written as an empty field
                Cell::Text(v) => v.filter(|s| !s.is_empty()),
            })
            .collect();
        Column::new(name.into(), values)
    }
}

fn write_frame(path: &Path, frame: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    // default quote style only quotes fields that need it
    CsvWriter::new(&mut file)
        .include_bom(true)
        .include_header(true)
        .with_separator(b',')
        .with_line_terminator("\n".into())
        .finish(frame)
        .map_err(table_error)?;
    tracing::info!(path = %path.display(), rows = frame.height(), "wrote csv");
    Ok(())
}
