//! Integration test: load → refactor PRs → reviews → split → unique, over local fixtures.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use reflens_botlens::BotClassifier;
use reflens_core::{ReflensConfig, ReflensError};
use reflens_dataset::export::{
    write_csv, write_list, write_table, BOT_REVIEWS_FILE, HUMAN_REVIEWS_FILE, REFACTOR_PRS_FILE, REVIEWS_FILE,
    UNIQUE_BOTS_FILE,
};
use reflens_dataset::source::read_local;
use reflens_dataset::stages::{
    build_split_stage, build_unique_stage, run_pr_stage, run_review_stage,
};
use reflens_dataset::SourceLoader;

const PRS_CSV: &str = "\u{feff}id,number,title,body,state,repo_id,user\n\
1,10,Refactor &amp; cleanup,<p>Moves code</p>,closed,100,devin-ai-integration[bot]\n\
2,11,Speed up build,\"Big re-factor of the <b>cache</b> layer\",merged,100,octocat\n\
3,12,Bump deps,nothing,open,200,renovate[bot]\n\
4,13,Refactoring tests,,open,300,alice\n";

const REVIEWS_CSV: &str = "pr_id,user,state,submitted_at,body\n\
1,alice,APPROVED,2025-01-01T00:00:00Z,Looks <b>good</b>\n\
1,coderabbitai[bot],COMMENTED,2025-01-01T00:01:00Z,<details>summary</details>\n\
2,Copilot,COMMENTED,2025-01-02T00:00:00Z,\n\
2,lint_bot,COMMENTED,2025-01-02T00:02:00Z,fix lint\n\
3,bob,APPROVED,2025-01-03T00:00:00Z,ok\n";

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn write_repos_parquet(dir: &Path) -> String {
    let mut frame = DataFrame::new(vec![
        Column::new("id".into(), vec![100i64, 200]),
        Column::new("full_name".into(), vec!["octo/widgets", "octo/gears"]),
        Column::new("language".into(), vec![Some("Rust"), None]),
        Column::new("forks".into(), vec![Some(4i64), Some(0)]),
        Column::new("stars".into(), vec![Some(321i64), None]),
    ])
    .unwrap();
    let path = dir.join("repositories.parquet");
    let file = File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut frame).unwrap();
    path.to_string_lossy().into_owned()
}

fn config(dir: &Path) -> ReflensConfig {
    let mut config = ReflensConfig::default();
    config.sources.pull_requests = vec![
        dir.join("missing_prs.parquet").to_string_lossy().into_owned(),
        write(dir, "prs.csv", PRS_CSV),
    ];
    config.sources.repositories = vec![write_repos_parquet(dir)];
    config.sources.reviews = vec![write(dir, "reviews.csv", REVIEWS_CSV)];
    config
}

fn body(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "{} has no BOM", path.display());
    String::from_utf8(bytes[3..].to_vec()).unwrap()
}

#[tokio::test]
async fn end_to_end_on_local_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let loader = SourceLoader::new(&config.sources).unwrap();

    // Step 1: refactor pull requests
    let prs = run_pr_stage(&loader, &config).await.unwrap();
    assert_eq!(prs.loaded_prs, 4);
    assert_eq!(prs.merged_rows, 3, "PR 4 has no repository");
    let ids: Vec<_> = prs.refactor_prs.iter().map(|p| p.pr_id()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(prs.refactor_prs[0].pull_request.title, "Refactor & cleanup");
    assert_eq!(prs.refactor_prs[0].pull_request.body, "Moves code");
    assert_eq!(prs.refactor_prs[1].repository.stars, Some(321));

    let out = dir.path().join("out");
    write_csv(&out.join(REFACTOR_PRS_FILE), &prs.columns, &prs.refactor_prs).unwrap();
    let exported = body(&out.join(REFACTOR_PRS_FILE));
    assert!(exported.starts_with("pr_id,number,title,state,user,repo_id,full_name"));
    assert!(exported.contains("1,10,Refactor & cleanup,closed,devin-ai-integration[bot],100,octo/widgets,Rust,4,321"));

    // Step 2: reviews of those pull requests
    let reviews = run_review_stage(&loader, &config, &prs).await.unwrap();
    assert_eq!(reviews.loaded_reviews, 5);
    assert_eq!(reviews.reviews.len(), 4);
    assert_eq!(reviews.covered_prs, 2);
    assert_eq!(reviews.reviews[0].body.as_deref(), Some("Looks good"));
    assert_eq!(reviews.reviews[1].body.as_deref(), Some("summary"));
    assert!(reviews
        .reviews
        .iter()
        .all(|r| r.full_name.as_deref() == Some("octo/widgets")));

    let reviews_path = out.join(REVIEWS_FILE);
    write_csv(&reviews_path, &reviews.columns, &reviews.reviews).unwrap();

    // Step 3: split the exported file
    let exported = read_local("reviews", &reviews_path).unwrap();
    let split = build_split_stage(&exported, &BotClassifier::new()).unwrap();
    let bots: Vec<_> = split.bots.text("user").unwrap().into_iter().flatten().collect();
    assert_eq!(bots, vec!["coderabbitai[bot]", "Copilot", "lint_bot"]);
    assert_eq!(split.humans.height(), 1);
    assert_eq!(split.humans.int("stars").unwrap(), vec![Some(321)]);

    let bots_path = out.join(BOT_REVIEWS_FILE);
    write_table(&bots_path, &split.bots, &split.columns).unwrap();
    write_table(&out.join(HUMAN_REVIEWS_FILE), &split.humans, &split.columns).unwrap();
    assert_eq!(body(&bots_path).lines().count(), 4);

    // Step 4: distinct bot reviewers
    let bot_table = read_local("bot reviews", &bots_path).unwrap();
    let unique = build_unique_stage(&bot_table).unwrap();
    assert_eq!(unique, vec!["coderabbitai[bot]", "copilot", "lint_bot"]);
    write_list(&out.join(UNIQUE_BOTS_FILE), "user", &unique).unwrap();
    assert_eq!(
        body(&out.join(UNIQUE_BOTS_FILE)),
        "user\ncoderabbitai[bot]\ncopilot\nlint_bot\n"
    );
}

#[tokio::test]
async fn falls_back_past_unreadable_sources() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SourceLoader::new(&ReflensConfig::default().sources).unwrap();
    let candidates = vec![
        dir.path().join("nope.parquet").to_string_lossy().into_owned(),
        write(dir.path(), "broken.parquet", "not parquet at all"),
        write(dir.path(), "reviews.csv", REVIEWS_CSV),
    ];

    let table = loader.read_first_available("reviews", &candidates).await.unwrap();
    assert_eq!(table.height(), 5);
}

#[tokio::test]
async fn all_sources_failing_reports_last_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SourceLoader::new(&ReflensConfig::default().sources).unwrap();
    let last = dir.path().join("second.csv").to_string_lossy().into_owned();
    let candidates = vec![
        dir.path().join("first.csv").to_string_lossy().into_owned(),
        last.clone(),
    ];

    let err = loader
        .read_first_available("reviews", &candidates)
        .await
        .unwrap_err();
    match err {
        ReflensError::Source { location, .. } => assert_eq!(location, last),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_source_list_is_an_error() {
    let loader = SourceLoader::new(&ReflensConfig::default().sources).unwrap();
    let err = loader.read_first_available("reviews", &[]).await.unwrap_err();
    assert!(matches!(err, ReflensError::NoSources(ref t) if t == "reviews"));
}

#[tokio::test]
async fn missing_required_column_stops_the_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.sources.pull_requests = vec![write(dir.path(), "bad_prs.csv", "id,title\n1,Refactor\n")];
    let loader = SourceLoader::new(&config.sources).unwrap();

    let err = run_pr_stage(&loader, &config).await.unwrap_err();
    assert!(
        err.to_string().contains("column 'repo_id' not found"),
        "got: {err}"
    );
}
