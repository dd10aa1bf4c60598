//! Stage summaries as printed by the CLI.

use std::fmt::Write as _;
use std::path::PathBuf;

use reflens_botlens::split::SplitSummary;
use reflens_core::{JoinedPr, Review};
use reflens_dataset::stages::{PrSummary, ReviewSummary};
use serde::Serialize;

/// Rows shown in a stage sample.
pub const SAMPLE_ROWS: usize = 10;
/// Reviewers listed by `unique` in text and markdown output.
pub const LISTED_REVIEWERS: usize = 50;

/// Human-readable renderings of a report. JSON comes from `Serialize`.
pub trait Render {
    fn text(&self, use_color: bool) -> String;
    fn markdown(&self) -> String;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrReport {
    pub output: PathBuf,
    #[serde(flatten)]
    pub summary: PrSummary,
    pub sample: Vec<JoinedPr>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub output: PathBuf,
    #[serde(flatten)]
    pub summary: ReviewSummary,
    pub sample: Vec<Review>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    pub input: PathBuf,
    pub humans_output: PathBuf,
    pub bots_output: PathBuf,
    #[serde(flatten)]
    pub summary: SplitSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub count: usize,
    pub reviewers: Vec<String>,
}

/// Summary of `run`: reviews, then the split, then the unique bot list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub reviews: ReviewReport,
    pub split: SplitReport,
    pub unique: UniqueReport,
}

fn heading(title: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[1m{title}\x1b[0m\n")
    } else {
        format!("{title}\n")
    }
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn cell(text: Option<&str>) -> String {
    text.unwrap_or("").replace('|', "\\|")
}

fn percent(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 10.0
}

impl Render for PrReport {
    fn text(&self, use_color: bool) -> String {
        let s = &self.summary;
        let mut out = heading("Refactor pull requests", use_color);
        let _ = writeln!(
            out,
            "  loaded:   {} pull requests, {} repositories",
            s.loaded_prs, s.loaded_repositories
        );
        let _ = writeln!(out, "  refactor: {} of {} joined rows", s.refactor_prs, s.merged_rows);
        let _ = writeln!(out, "  wrote:    {}", self.output.display());

        if self.sample.is_empty() {
            out.push_str("\nNo refactor pull requests found.\n");
            return out;
        }
        let _ = writeln!(out, "\nSample (first {}):", self.sample.len());
        for pr in &self.sample {
            let _ = writeln!(
                out,
                "  {:>10}  {:<32}  {}",
                pr.pr_id(),
                clip(pr.repository.full_name.as_deref().unwrap_or("-"), 32),
                clip(&pr.pull_request.title, 80)
            );
        }
        out
    }

    fn markdown(&self) -> String {
        let s = &self.summary;
        let mut out = String::from("## Refactor pull requests\n\n");
        let _ = writeln!(
            out,
            "**{}** refactor PRs out of {} joined rows ({} pull requests, {} repositories loaded).\n",
            s.refactor_prs, s.merged_rows, s.loaded_prs, s.loaded_repositories
        );
        let _ = writeln!(out, "Written to `{}`.\n", self.output.display());
        if !self.sample.is_empty() {
            out.push_str("| pr_id | repository | title |\n|---|---|---|\n");
            for pr in &self.sample {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} |",
                    pr.pr_id(),
                    cell(pr.repository.full_name.as_deref()),
                    cell(Some(&clip(&pr.pull_request.title, 80)))
                );
            }
        }
        out
    }
}

impl Render for ReviewReport {
    fn text(&self, use_color: bool) -> String {
        let s = &self.summary;
        let mut out = heading("Refactor PR reviews", use_color);
        let _ = writeln!(out, "  refactor PRs:  {}", s.refactor_prs);
        let _ = writeln!(
            out,
            "  with reviews:  {} ({}%)",
            s.covered_prs,
            percent(s.coverage)
        );
        let _ = writeln!(
            out,
            "  review rows:   {} (of {} loaded)",
            s.review_rows, s.loaded_reviews
        );
        let _ = writeln!(out, "  wrote:         {}", self.output.display());

        if self.sample.is_empty() {
            out.push_str("\nNo reviews found for refactor pull requests.\n");
            return out;
        }
        let _ = writeln!(out, "\nSample (first {}):", self.sample.len());
        for review in &self.sample {
            let _ = writeln!(
                out,
                "  {:>10}  {:<24}  {:<18}  {}",
                review.pr_id,
                clip(review.user.as_deref().unwrap_or("-"), 24),
                review.state.as_deref().unwrap_or("-"),
                clip(review.body.as_deref().unwrap_or(""), 60)
            );
        }
        out
    }

    fn markdown(&self) -> String {
        let s = &self.summary;
        let mut out = String::from("## Refactor PR reviews\n\n");
        let _ = writeln!(
            out,
            "{} of {} refactor PRs have reviews ({}%); {} review rows kept out of {} loaded.\n",
            s.covered_prs,
            s.refactor_prs,
            percent(s.coverage),
            s.review_rows,
            s.loaded_reviews
        );
        let _ = writeln!(out, "Written to `{}`.\n", self.output.display());
        if !self.sample.is_empty() {
            out.push_str("| pr_id | user | state | body |\n|---|---|---|---|\n");
            for review in &self.sample {
                let body = review.body.as_deref().map(|b| clip(b, 60));
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    review.pr_id,
                    cell(review.user.as_deref()),
                    cell(review.state.as_deref()),
                    cell(body.as_deref())
                );
            }
        }
        out
    }
}

impl Render for SplitReport {
    fn text(&self, use_color: bool) -> String {
        let mut out = heading("Reviewer split", use_color);
        let _ = writeln!(out, "  input:      {}", self.input.display());
        let _ = writeln!(
            out,
            "  human rows: {} -> {}",
            self.summary.human_rows,
            self.humans_output.display()
        );
        let _ = writeln!(
            out,
            "  bot rows:   {} -> {}",
            self.summary.bot_rows,
            self.bots_output.display()
        );
        out
    }

    fn markdown(&self) -> String {
        let mut out = String::from("## Reviewer split\n\n| kind | rows | file |\n|---|---|---|\n");
        let _ = writeln!(
            out,
            "| human | {} | `{}` |",
            self.summary.human_rows,
            self.humans_output.display()
        );
        let _ = writeln!(
            out,
            "| bot | {} | `{}` |",
            self.summary.bot_rows,
            self.bots_output.display()
        );
        out
    }
}

impl Render for UniqueReport {
    fn text(&self, use_color: bool) -> String {
        let mut out = heading("Unique reviewers", use_color);
        let _ = writeln!(out, "  {} distinct in {}", self.count, self.input.display());
        let _ = writeln!(out, "  wrote: {}", self.output.display());
        if !self.reviewers.is_empty() {
            out.push('\n');
        }
        for login in self.reviewers.iter().take(LISTED_REVIEWERS) {
            let _ = writeln!(out, "  {login}");
        }
        if self.count > LISTED_REVIEWERS {
            let _ = writeln!(out, "  ... and {} more", self.count - LISTED_REVIEWERS);
        }
        out
    }

    fn markdown(&self) -> String {
        let mut out = String::from("## Unique reviewers\n\n");
        let _ = writeln!(
            out,
            "{} distinct reviewers in `{}`, written to `{}`.\n",
            self.count,
            self.input.display(),
            self.output.display()
        );
        for login in self.reviewers.iter().take(LISTED_REVIEWERS) {
            let _ = writeln!(out, "- `{login}`");
        }
        if self.count > LISTED_REVIEWERS {
            let _ = writeln!(out, "- ... and {} more", self.count - LISTED_REVIEWERS);
        }
        out
    }
}

impl Render for RunReport {
    fn text(&self, use_color: bool) -> String {
        format!(
            "{}\n{}\n{}",
            self.reviews.text(use_color),
            self.split.text(use_color),
            self.unique.text(use_color)
        )
    }

    fn markdown(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.reviews.markdown(),
            self.split.markdown(),
            self.unique.markdown()
        )
    }
}
