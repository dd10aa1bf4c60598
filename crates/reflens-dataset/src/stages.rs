//! Pipeline stages: refactor PRs, their reviews, and the reviewer split.
//!
//! Each stage has a pure `build_*` function over already-loaded tables and,
//! where it needs the network, an async `run_*` wrapper that loads the
//! sources first.

use std::collections::{HashMap, HashSet};

use reflens_botlens::split::{bot_mask, SplitSummary};
use reflens_botlens::unique::unique_reviewers;
use reflens_botlens::BotClassifier;
use reflens_core::{JoinedPr, PullRequest, ReflensConfig, Repository, Result, Review};
use reflens_textlens::{is_refactor_pr, Normalizer};
use serde::Serialize;

use crate::export::{select_columns, PR_COLUMNS, REVIEW_COLUMNS};
use crate::records;
use crate::source::SourceLoader;
use crate::table::Table;

pub const PULL_REQUESTS: &str = "pull_requests";
pub const REPOSITORIES: &str = "repositories";
pub const REVIEWS: &str = "reviews";

/// Inner-join pull requests with repositories on `repo_id == id`.
///
/// A repository id listed twice yields one joined row per listing; pull
/// requests without a matching repository are dropped.
///
/// # Examples
///
/// ```
/// use reflens_core::{PullRequest, Repository};
/// use reflens_dataset::stages::join_repositories;
///
/// let prs = vec![
///     PullRequest { pr_id: 1, repo_id: 10, ..PullRequest::default() },
///     PullRequest { pr_id: 2, repo_id: 99, ..PullRequest::default() },
/// ];
/// let repos = vec![Repository { id: 10, ..Repository::default() }];
/// let joined = join_repositories(prs, &repos);
/// assert_eq!(joined.len(), 1);
/// assert_eq!(joined[0].pr_id(), 1);
/// ```
pub fn join_repositories(prs: Vec<PullRequest>, repos: &[Repository]) -> Vec<JoinedPr> {
    let mut by_id: HashMap<i64, Vec<&Repository>> = HashMap::new();
    for repo in repos {
        by_id.entry(repo.id).or_default().push(repo);
    }

    let mut joined = Vec::with_capacity(prs.len());
    for pr in prs {
        let Some(matches) = by_id.get(&pr.repo_id) else {
            continue;
        };
        for repo in matches {
            joined.push(JoinedPr {
                pull_request: pr.clone(),
                repository: (*repo).clone(),
            });
        }
    }
    joined
}

/// Normalize titles and bodies, then keep pull requests that mention refactoring.
pub fn filter_refactor_prs(joined: Vec<JoinedPr>, normalizer: &Normalizer) -> Vec<JoinedPr> {
    joined
        .into_iter()
        .filter_map(|mut pr| {
            let pull = &mut pr.pull_request;
            pull.title = normalizer.normalize(Some(&pull.title));
            pull.body = normalizer.normalize(Some(&pull.body));
            is_refactor_pr(&pull.title, &pull.body).then_some(pr)
        })
        .collect()
}

/// Keep reviews of refactor PRs and attach their repository context.
///
/// Every returned review's `pr_id` belongs to `refactor_prs`; review bodies
/// are normalized. Existing `full_name`/`stars` values on a review win over
/// the pull request's.
pub fn select_reviews(
    reviews: Vec<Review>,
    refactor_prs: &[JoinedPr],
    normalizer: &Normalizer,
) -> Vec<Review> {
    let mut context: HashMap<i64, &Repository> = HashMap::new();
    for pr in refactor_prs {
        context.entry(pr.pr_id()).or_insert(&pr.repository);
    }

    reviews
        .into_iter()
        .filter_map(|mut review| {
            let repo = context.get(&review.pr_id)?;
            review.body = review.body.map(|b| normalizer.normalize(Some(&b)));
            if review.full_name.is_none() {
                review.full_name = repo.full_name.clone();
            }
            if review.stars.is_none() {
                review.stars = repo.stars;
            }
            Some(review)
        })
        .collect()
}

/// Output of the refactor PR stage.
#[derive(Debug, Clone)]
pub struct PrStage {
    pub loaded_prs: usize,
    pub loaded_repositories: usize,
    /// Rows after the repository join, before the refactor filter.
    pub merged_rows: usize,
    pub refactor_prs: Vec<JoinedPr>,
    /// Export columns present in the source tables.
    pub columns: Vec<&'static str>,
}

impl PrStage {
    pub fn summary(&self) -> PrSummary {
        PrSummary {
            loaded_prs: self.loaded_prs,
            loaded_repositories: self.loaded_repositories,
            merged_rows: self.merged_rows,
            refactor_prs: self.refactor_prs.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrSummary {
    pub loaded_prs: usize,
    pub loaded_repositories: usize,
    pub merged_rows: usize,
    pub refactor_prs: usize,
}

/// Join, normalize, and filter already-loaded PR and repository tables.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if a required column is absent.
pub fn build_pr_stage(
    prs: &Table,
    repos: &Table,
    normalizer: &Normalizer,
) -> Result<PrStage> {
    let pull_requests = records::pull_requests(prs)?;
    let repositories = records::repositories(repos)?;
    let loaded_prs = prs.height();
    let loaded_repositories = repos.height();

    let joined = join_repositories(pull_requests, &repositories);
    let merged_rows = joined.len();
    tracing::info!(merged_rows, "joined pull requests with repositories");

    let refactor_prs = filter_refactor_prs(joined, normalizer);
    tracing::info!(
        refactor_prs = refactor_prs.len(),
        merged_rows,
        "filtered refactor pull requests"
    );

    // id, title, and repository metadata are always produced
    let mut present: Vec<String> = prs.columns().to_vec();
    present.extend(
        ["pr_id", "title", "repo_id", "full_name", "language", "forks", "stars"]
            .iter()
            .map(|c| c.to_string()),
    );
    let columns = select_columns(PR_COLUMNS, &present);

    Ok(PrStage {
        loaded_prs,
        loaded_repositories,
        merged_rows,
        refactor_prs,
        columns,
    })
}

/// Load the PR and repository sources, then run [`build_pr_stage`].
pub async fn run_pr_stage(
    loader: &SourceLoader,
    config: &ReflensConfig,
) -> Result<PrStage> {
    let prs = loader
        .read_first_available(PULL_REQUESTS, &config.sources.pull_requests)
        .await?;
    let repos = loader
        .read_first_available(REPOSITORIES, &config.sources.repositories)
        .await?;
    build_pr_stage(&prs, &repos, &Normalizer::new(config.text.tag_replacement))
}

/// Output of the review extraction stage.
#[derive(Debug, Clone)]
pub struct ReviewStage {
    pub loaded_reviews: usize,
    pub refactor_prs: usize,
    /// Distinct refactor PRs with at least one review.
    pub covered_prs: usize,
    pub reviews: Vec<Review>,
    pub columns: Vec<&'static str>,
}

impl ReviewStage {
    /// Share of refactor PRs with at least one review (0 when there are none).
    pub fn coverage(&self) -> f64 {
        if self.refactor_prs == 0 {
            0.0
        } else {
            self.covered_prs as f64 / self.refactor_prs as f64
        }
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            loaded_reviews: self.loaded_reviews,
            refactor_prs: self.refactor_prs,
            covered_prs: self.covered_prs,
            coverage: self.coverage(),
            review_rows: self.reviews.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub loaded_reviews: usize,
    pub refactor_prs: usize,
    pub covered_prs: usize,
    pub coverage: f64,
    pub review_rows: usize,
}

/// Select the reviews of the stage's refactor PRs from a loaded review table.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if the table has no `pr_id`.
pub fn build_review_stage(
    pr_stage: &PrStage,
    reviews: &Table,
    normalizer: &Normalizer,
) -> Result<ReviewStage> {
    let loaded = records::reviews(reviews)?;
    let loaded_reviews = reviews.height();
    tracing::info!(rows = loaded.len(), "reviews table ready");

    let selected = select_reviews(loaded, &pr_stage.refactor_prs, normalizer);
    let covered_prs = selected
        .iter()
        .map(|r| r.pr_id)
        .collect::<HashSet<_>>()
        .len();
    tracing::info!(
        review_rows = selected.len(),
        covered_prs,
        "matched reviews to refactor pull requests"
    );

    let mut present: Vec<String> = reviews.columns().to_vec();
    if reviews.first_present(records::REVIEW_TIME_COLUMNS).is_some() {
        present.push("submitted_at".into());
    }
    present.extend(["full_name".to_string(), "stars".to_string()]);
    let columns = select_columns(REVIEW_COLUMNS, &present);

    Ok(ReviewStage {
        loaded_reviews,
        refactor_prs: pr_stage.refactor_prs.len(),
        covered_prs,
        reviews: selected,
        columns,
    })
}

/// Load the review source, then run [`build_review_stage`].
pub async fn run_review_stage(
    loader: &SourceLoader,
    config: &ReflensConfig,
    pr_stage: &PrStage,
) -> Result<ReviewStage> {
    let reviews = loader
        .read_first_available(REVIEWS, &config.sources.reviews)
        .await?;
    build_review_stage(
        pr_stage,
        &reviews,
        &Normalizer::new(config.text.review_tag_replacement),
    )
}

/// Output of the human/bot split.
///
/// Both sides keep the input rows as read, so values the review stage
/// never parsed (blank ids, float-formatted counts) pass through intact.
#[derive(Debug, Clone)]
pub struct SplitStage {
    pub humans: Table,
    pub bots: Table,
    pub columns: Vec<&'static str>,
}

impl SplitStage {
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            human_rows: self.humans.height(),
            bot_rows: self.bots.height(),
        }
    }
}

/// Split an exported review table by reviewer kind.
///
/// Only the `user` column is interpreted; every row lands on exactly one
/// side.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if the table has no `user` column.
pub fn build_split_stage(
    reviews: &Table,
    classifier: &BotClassifier,
) -> Result<SplitStage> {
    let users = reviews.text("user")?;
    let is_bot = bot_mask(users.iter().map(Option::as_deref), classifier);
    let is_human: Vec<bool> = is_bot.iter().map(|bot| !bot).collect();
    let stage = SplitStage {
        humans: reviews.filter_rows(&is_human)?,
        bots: reviews.filter_rows(&is_bot)?,
        columns: select_columns(REVIEW_COLUMNS, reviews.columns()),
    };
    tracing::debug!(
        humans = stage.humans.height(),
        bots = stage.bots.height(),
        "split review rows"
    );
    Ok(stage)
}

/// Distinct reviewers of an exported review table.
///
/// # Errors
///
/// Returns [`ReflensError::MissingColumn`](reflens_core::ReflensError::MissingColumn) if the table has no `user`.
pub fn build_unique_stage(reviews: &Table) -> Result<Vec<String>> {
    let rows: Vec<Review> = reviews
        .text("user")?
        .into_iter()
        .map(|user| Review {
            user,
            ..Review::default()
        })
        .collect();
    Ok(unique_reviewers(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflens_core::{ReflensError, TagReplacement};

    fn csv(name: &str, text: &str) -> Table {
        Table::from_csv_bytes(name, text.as_bytes().to_vec()).unwrap()
    }

    fn prs_table() -> Table {
        csv(
            PULL_REQUESTS,
            "id,number,title,body,state,repo_id,html_url\n\
             1,11,Refactor <b>auth</b>,,closed,100,https://x/1\n\
             2,12,Fix bug,We re-factored the parser,open,100,https://x/2\n\
             3,13,Add docs,Nothing here,open,100,https://x/3\n\
             4,14,Refactor orphan,,open,999,https://x/4\n\
             5,15,fix factory defaults,,open,200,https://x/5\n",
        )
    }

    fn repos_table() -> Table {
        csv(
            REPOSITORIES,
            "id,full_name,language,forks,stars\n\
             100,octo/widgets,Rust,3,120\n\
             200,octo/gears,Go,0,5\n",
        )
    }

    fn pr_stage() -> PrStage {
        build_pr_stage(&prs_table(), &repos_table(), &Normalizer::default()).unwrap()
    }

    #[test]
    fn pr_stage_filters_refactor_prs() {
        let stage = pr_stage();
        assert_eq!(stage.loaded_prs, 5);
        assert_eq!(stage.loaded_repositories, 2);
        assert_eq!(stage.merged_rows, 4);
        let ids: Vec<_> = stage.refactor_prs.iter().map(JoinedPr::pr_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stage.refactor_prs[0].pull_request.title, "Refactor auth");
        assert_eq!(
            stage.refactor_prs[0].repository.full_name.as_deref(),
            Some("octo/widgets")
        );
    }

    #[test]
    fn pr_stage_columns_follow_source() {
        let stage = pr_stage();
        assert_eq!(
            stage.columns,
            vec![
                "pr_id",
                "number",
                "title",
                "state",
                "repo_id",
                "full_name",
                "language",
                "forks",
                "stars",
                "html_url"
            ]
        );
    }

    #[test]
    fn join_duplicates_repeated_repository_ids() {
        let prs = vec![PullRequest {
            pr_id: 1,
            repo_id: 5,
            ..PullRequest::default()
        }];
        let repos = vec![
            Repository {
                id: 5,
                stars: Some(1),
                ..Repository::default()
            },
            Repository {
                id: 5,
                stars: Some(2),
                ..Repository::default()
            },
        ];
        assert_eq!(join_repositories(prs, &repos).len(), 2);
    }

    #[test]
    fn review_stage_keeps_only_refactor_pr_reviews() {
        let reviews = csv(
            REVIEWS,
            "id,pr_id,user,state,submitted_at,body\n\
             1,1,alice,APPROVED,2025-01-01,<p>LGTM</p><p>nice</p>\n\
             2,1,coderabbitai[bot],COMMENTED,2025-01-02,\n\
             3,3,bob,APPROVED,2025-01-03,ok\n\
             4,77,carol,APPROVED,2025-01-04,ok\n",
        );
        let prs = pr_stage();
        let stage =
            build_review_stage(&prs, &reviews, &Normalizer::new(TagReplacement::Space)).unwrap();

        assert_eq!(stage.loaded_reviews, 4);
        assert_eq!(stage.reviews.len(), 2);
        assert!(stage.reviews.len() <= stage.loaded_reviews);
        let refactor_ids: HashSet<_> = prs.refactor_prs.iter().map(JoinedPr::pr_id).collect();
        assert!(stage.reviews.iter().all(|r| refactor_ids.contains(&r.pr_id)));

        assert_eq!(stage.reviews[0].body.as_deref(), Some("LGTM nice"));
        assert_eq!(stage.reviews[0].full_name.as_deref(), Some("octo/widgets"));
        assert_eq!(stage.reviews[0].stars, Some(120));
        assert_eq!(stage.covered_prs, 1);
        assert_eq!(stage.refactor_prs, 2);
        assert!((stage.coverage() - 0.5).abs() < f64::EPSILON);
        assert_eq!(
            stage.columns,
            vec!["pr_id", "user", "state", "submitted_at", "full_name", "stars", "body"]
        );
    }

    #[test]
    fn review_stage_renames_timestamp_fallback() {
        let reviews = csv(REVIEWS, "pr_id,user,created_at\n2,alice,2025-03-03\n");
        let stage = build_review_stage(&pr_stage(), &reviews, &Normalizer::default()).unwrap();
        assert_eq!(stage.reviews[0].submitted_at.as_deref(), Some("2025-03-03"));
        assert_eq!(
            stage.columns,
            vec!["pr_id", "user", "submitted_at", "full_name", "stars"]
        );
    }

    #[test]
    fn coverage_is_zero_without_refactor_prs() {
        let stage = ReviewStage {
            loaded_reviews: 3,
            refactor_prs: 0,
            covered_prs: 0,
            reviews: vec![],
            columns: vec![],
        };
        assert_eq!(stage.coverage(), 0.0);
        assert_eq!(stage.summary().review_rows, 0);
    }

    #[test]
    fn split_stage_requires_user_column() {
        let table = csv(REVIEWS, "pr_id,state\n1,APPROVED\n");
        let err = build_split_stage(&table, &BotClassifier::new()).unwrap_err();
        assert!(matches!(err, ReflensError::MissingColumn { ref column, .. } if column == "user"));
    }

    #[test]
    fn split_stage_partitions_rows() {
        let table = csv(
            REVIEWS,
            "pr_id,user,state,submitted_at,full_name,stars,body\n\
             1,alice,APPROVED,t,o/w,1,ok\n\
             1,dependabot[bot],COMMENTED,t,o/w,1,\n\
             2,some-bot,COMMENTED,t,o/w,1,\n\
             2,,COMMENTED,t,o/w,1,\n",
        );
        let stage = build_split_stage(&table, &BotClassifier::new()).unwrap();
        assert_eq!(stage.bots.height(), 2);
        assert_eq!(stage.humans.height(), 2);
        assert_eq!(stage.columns, REVIEW_COLUMNS.to_vec());
        assert_eq!(
            stage.bots.text("user").unwrap(),
            vec![Some("dependabot[bot]".to_string()), Some("some-bot".to_string())]
        );
    }

    #[test]
    fn split_stage_keeps_rows_without_pr_id() {
        let table = csv(
            REVIEWS,
            "pr_id,user,stars
1,alice,10.0
,dependabot[bot],
abc,bob,7
",
        );
        let stage = build_split_stage(&table, &BotClassifier::new()).unwrap();
        assert_eq!(stage.humans.height() + stage.bots.height(), table.height());
        assert_eq!(stage.summary(), SplitSummary { human_rows: 2, bot_rows: 1 });
        assert_eq!(
            stage.humans.text("pr_id").unwrap(),
            vec![Some("1".to_string()), Some("abc".to_string())]
        );
        assert_eq!(
            stage.humans.text("stars").unwrap(),
            vec![Some("10.0".to_string()), Some("7".to_string())]
        );
    }

    #[test]
    fn split_stage_needs_only_user_column() {
        let table = csv(REVIEWS, "user,state
alice,APPROVED
ci_bot,COMMENTED
");
        let stage = build_split_stage(&table, &BotClassifier::new()).unwrap();
        assert_eq!(stage.summary(), SplitSummary { human_rows: 1, bot_rows: 1 });
        assert_eq!(stage.columns, vec!["user", "state"]);
    }

    #[test]
    fn unique_stage_lists_sorted_logins() {
        let table = csv(
            REVIEWS,
            "pr_id,user\n1,Renovate[bot]\n2,renovate[bot]\n3,codecov[bot]\n4,\n",
        );
        assert_eq!(
            build_unique_stage(&table).unwrap(),
            vec!["codecov[bot]", "renovate[bot]"]
        );
    }
}
