//! Typed record extraction from loaded tables.

use reflens_core::{PullRequest, Repository, Result, Review};

use crate::table::Table;

/// Candidate names of the pull request id column, in preference order.
pub const PR_ID_COLUMNS: &[&str] = &["id", "pr_id"];

/// Candidate names of the review timestamp column, in preference order.
pub const REVIEW_TIME_COLUMNS: &[&str] = &["submitted_at", "submitted", "created_at"];

fn values<T: Clone>(column: &Option<Vec<Option<T>>>, row: usize) -> Option<T> {
    column.as_ref().and_then(|c| c.get(row).cloned().flatten())
}

/// Extract pull requests.
///
/// The id comes from `id`, falling back to `pr_id`; `repo_id` is required.
/// Rows with a null id or repository id are dropped. Missing `title`/`body`
/// columns read as empty text.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if no id column or no `repo_id`
/// column exists.
pub fn pull_requests(table: &Table) -> Result<Vec<PullRequest>> {
    let id_column = table
        .first_present(PR_ID_COLUMNS)
        .ok_or_else(|| table.missing("id"))?;
    tracing::debug!(column = id_column, "using pull request id column");

    let ids = table.int(id_column)?;
    let repo_ids = table.int("repo_id")?;
    let titles = table.optional_text("title")?;
    let bodies = table.optional_text("body")?;
    let numbers = table.optional_int("number")?;
    let states = table.optional_text("state")?;
    let created = table.optional_text("created_at")?;
    let closed = table.optional_text("closed_at")?;
    let merged = table.optional_text("merged_at")?;
    let users = table.optional_text("user")?;
    let html_urls = table.optional_text("html_url")?;
    let repo_urls = table.optional_text("repo_url")?;

    let mut prs = Vec::with_capacity(ids.len());
    for (row, (id, repo_id)) in ids.into_iter().zip(repo_ids).enumerate() {
        let (Some(pr_id), Some(repo_id)) = (id, repo_id) else {
            continue;
        };
        prs.push(PullRequest {
            pr_id,
            repo_id,
            title: values(&titles, row).unwrap_or_default(),
            body: values(&bodies, row).unwrap_or_default(),
            number: values(&numbers, row),
            state: values(&states, row),
            created_at: values(&created, row),
            closed_at: values(&closed, row),
            merged_at: values(&merged, row),
            user: values(&users, row),
            html_url: values(&html_urls, row),
            repo_url: values(&repo_urls, row),
        });
    }
    Ok(prs)
}

/// Extract repositories. All five metadata columns are required.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) for any absent column.
pub fn repositories(table: &Table) -> Result<Vec<Repository>> {
    let ids = table.int("id")?;
    let names = Some(table.text("full_name")?);
    let languages = Some(table.text("language")?);
    let forks = Some(table.int("forks")?);
    let stars = Some(table.int("stars")?);

    Ok(ids
        .into_iter()
        .enumerate()
        .filter_map(|(row, id)| {
            Some(Repository {
                id: id?,
                full_name: values(&names, row),
                language: values(&languages, row),
                forks: values(&forks, row),
                stars: values(&stars, row),
            })
        })
        .collect())
}

/// Extract reviews. Only `pr_id` is required.
///
/// The timestamp comes from the first of [`REVIEW_TIME_COLUMNS`] present.
/// `full_name` and `stars` are read when present (a previously exported
/// review file carries them). Rows with a null `pr_id` are dropped.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if `pr_id` is absent.
pub fn reviews(table: &Table) -> Result<Vec<Review>> {
    let pr_ids = table.int("pr_id")?;
    let users = table.optional_text("user")?;
    let states = table.optional_text("state")?;
    let times = match table.first_present(REVIEW_TIME_COLUMNS) {
        Some(column) => {
            tracing::debug!(column, "using review timestamp column");
            table.optional_text(column)?
        }
        None => None,
    };
    let bodies = table.optional_text("body")?;
    let names = table.optional_text("full_name")?;
    let stars = table.optional_int("stars")?;

    Ok(pr_ids
        .into_iter()
        .enumerate()
        .filter_map(|(row, pr_id)| {
            Some(Review {
                pr_id: pr_id?,
                user: values(&users, row),
                state: values(&states, row),
                submitted_at: values(&times, row),
                body: values(&bodies, row),
                full_name: values(&names, row),
                stars: values(&stars, row),
            })
        })
        .collect())
}
