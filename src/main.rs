mod report;

use std::future::Future;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use reflens_botlens::BotClassifier;
use reflens_core::{OutputFormat, ReflensConfig, ReflensError};
use reflens_dataset::export::{
    write_csv, write_list, write_table, BOT_REVIEWS_FILE, HUMAN_REVIEWS_FILE, REFACTOR_PRS_FILE, REVIEWS_FILE,
    UNIQUE_BOTS_FILE,
};
use reflens_dataset::source::read_local;
use reflens_dataset::stages::{
    build_split_stage, build_unique_stage, run_pr_stage, run_review_stage, PrStage,
};
use reflens_dataset::SourceLoader;

use report::{
    PrReport, Render, ReviewReport, RunReport, SplitReport, UniqueReport, SAMPLE_ROWS,
};

#[derive(Parser)]
#[command(
    name = "reflens",
    version,
    about = "Refactoring pull-request review analysis",
    long_about = "reflens finds refactoring pull requests in the AIDev dataset, extracts their\n\
                   code reviews, and splits reviewers into humans and bots.\n\n\
                   Each stage writes a CSV file into the output directory.\n\n\
                   Examples:\n  \
                     reflens prs                     Export refactor pull requests\n  \
                     reflens reviews                 Export reviews of refactor pull requests\n  \
                     reflens split                   Split exported reviews into humans and bots\n  \
                     reflens unique                  List distinct bot reviewers\n  \
                     reflens run --out-dir results   Reviews, split, and unique in one go"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .reflens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for exported files (overrides [output] dir)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for stage summaries.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Export pull requests that mention refactoring
    #[command(long_about = "Export pull requests that mention refactoring.\n\n\
        Loads pull requests and repositories, joins them on repo_id, normalizes\n\
        titles and bodies, and keeps pull requests whose text references refactoring.\n\
        Writes AIDev_all_refactor_PRs.csv.\n\n\
        Examples:\n  reflens prs\n  reflens prs --format json")]
    Prs,
    /// Export reviews of refactor pull requests
    #[command(long_about = "Export reviews of refactor pull requests.\n\n\
        Finds refactor pull requests as `reflens prs` does, then keeps the review rows\n\
        that belong to them with normalized bodies and repository context.\n\
        Writes AIDev_all_refactor_PR_reviews.csv.")]
    Reviews,
    /// Split exported reviews into human and bot reviewers
    #[command(long_about = "Split exported reviews into human and bot reviewers.\n\n\
        Reads the review export and writes AIDev_pop_refactor_reviewers_humans.csv\n\
        and AIDev_pop_refactor_reviewers_bots.csv. Rows are not de-duplicated.\n\n\
        Examples:\n  reflens split\n  reflens split --input reviews.csv --out-dir split/")]
    Split {
        /// Review CSV to split (default: <out-dir>/AIDev_all_refactor_PR_reviews.csv)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// List distinct reviewers of a split file
    #[command(long_about = "List distinct reviewers of a split file.\n\n\
        Lowercases, trims, de-duplicates, and sorts the user column and writes\n\
        one login per line under a `user` header.\n\n\
        Examples:\n  reflens unique\n  reflens unique --input AIDev_pop_refactor_reviewers_humans.csv --output humans.txt")]
    Unique {
        /// Split CSV to read (default: <out-dir>/AIDev_pop_refactor_reviewers_bots.csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// File to write (default: <out-dir>/unique_bots_reviewers.txt)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run reviews, split, and unique in sequence
    Run,
    /// Create a default .reflens.toml configuration file
    #[command(long_about = "Create a default .reflens.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .reflens.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mreflens\x1b[0m v{version}: who reviews refactoring pull requests?\n");

        println!("Quick start:");
        println!("  \x1b[36mreflens init\x1b[0m                  Create a .reflens.toml config file");
        println!("  \x1b[36mreflens run --out-dir out\x1b[0m     Export reviews and split reviewers\n");

        println!("All commands:");
        println!("  \x1b[32mprs\x1b[0m       Refactor pull requests joined with repository metadata");
        println!("  \x1b[32mreviews\x1b[0m   Reviews of refactor pull requests");
        println!("  \x1b[32msplit\x1b[0m     Human versus bot reviewer rows");
        println!("  \x1b[32munique\x1b[0m    Distinct reviewers of a split file");
        println!("  \x1b[32mrun\x1b[0m       reviews, split, and unique in sequence");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("reflens v{version}: who reviews refactoring pull requests?\n");

        println!("Quick start:");
        println!("  reflens init                  Create a .reflens.toml config file");
        println!("  reflens run --out-dir out     Export reviews and split reviewers\n");

        println!("All commands:");
        println!("  prs       Refactor pull requests joined with repository metadata");
        println!("  reviews   Reviews of refactor pull requests");
        println!("  split     Human versus bot reviewer rows");
        println!("  unique    Distinct reviewers of a split file");
        println!("  run       reviews, split, and unique in sequence");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'reflens <command> --help' for details.");
}

// Library crates only; dependency crates stay at info.
const VERBOSE_FILTER: &str =
    "info,reflens=debug,reflens_core=debug,reflens_textlens=debug,reflens_botlens=debug,reflens_dataset=debug";

fn init_tracing(verbose: bool, use_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .init();
}

async fn with_spinner<T, F>(message: &str, work: F) -> Result<T, ReflensError>
where
    F: Future<Output = Result<T, ReflensError>>,
{
    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let result = work.await;
    if let Some(pb) = spinner {
        match &result {
            Ok(_) => pb.finish_and_clear(),
            Err(_) => pb.finish_with_message("Failed"),
        }
    }
    result
}

fn emit<R: Render + Serialize>(report: &R, format: OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(ReflensError::from)?;
            println!("{json}");
        }
        OutputFormat::Markdown => print!("{}", report.markdown()),
        OutputFormat::Text => print!("{}", report.text(use_color)),
    }
    Ok(())
}

async fn load_refactor_prs(loader: &SourceLoader, config: &ReflensConfig) -> Result<PrStage> {
    tracing::info!("step 1: refactor pull requests");
    let stage = with_spinner(
        "Loading pull requests and repositories...",
        run_pr_stage(loader, config),
    )
    .await?;
    Ok(stage)
}

async fn prs_command(
    loader: &SourceLoader,
    config: &ReflensConfig,
    out_dir: &Path,
) -> Result<PrReport> {
    let stage = load_refactor_prs(loader, config).await?;
    let output = out_dir.join(REFACTOR_PRS_FILE);
    write_csv(&output, &stage.columns, &stage.refactor_prs)?;

    Ok(PrReport {
        output,
        summary: stage.summary(),
        sample: stage.refactor_prs.iter().take(SAMPLE_ROWS).cloned().collect(),
    })
}

async fn reviews_command(
    loader: &SourceLoader,
    config: &ReflensConfig,
    out_dir: &Path,
) -> Result<ReviewReport> {
    let prs = load_refactor_prs(loader, config).await?;

    tracing::info!("step 2: reviews of refactor pull requests");
    let stage = with_spinner("Loading reviews...", run_review_stage(loader, config, &prs)).await?;
    let output = out_dir.join(REVIEWS_FILE);
    write_csv(&output, &stage.columns, &stage.reviews)?;

    Ok(ReviewReport {
        output,
        summary: stage.summary(),
        sample: stage.reviews.iter().take(SAMPLE_ROWS).cloned().collect(),
    })
}

fn split_command(config: &ReflensConfig, input: PathBuf, out_dir: &Path) -> Result<SplitReport> {
    tracing::info!(input = %input.display(), "step 3: split reviewers");
    let table = read_local("reviews", &input)?;
    let stage = build_split_stage(&table, &BotClassifier::from_config(&config.bots))?;

    let humans_output = out_dir.join(HUMAN_REVIEWS_FILE);
    let bots_output = out_dir.join(BOT_REVIEWS_FILE);
    write_table(&humans_output, &stage.humans, &stage.columns)?;
    write_table(&bots_output, &stage.bots, &stage.columns)?;

    Ok(SplitReport {
        input,
        humans_output,
        bots_output,
        summary: stage.summary(),
    })
}

fn unique_command(input: PathBuf, output: PathBuf) -> Result<UniqueReport> {
    tracing::info!(input = %input.display(), "step 4: unique reviewers");
    let table = read_local("split reviews", &input)?;
    let reviewers = build_unique_stage(&table)?;
    write_list(&output, "user", &reviewers)?;

    Ok(UniqueReport {
        input,
        output,
        count: reviewers.len(),
        reviewers,
    })
}

const DEFAULT_CONFIG: &str = r#"# reflens configuration

[sources]
# Each source is an ordered list of locations; the first readable one wins.
# Locations: hf://datasets/<owner>/<name>[@revision]/<file>, http(s) URLs, or local paths.
# Files ending in .csv are read as CSV, everything else as Parquet.
# pull_requests = [
#     "hf://datasets/hao-li/AIDev/all_pull_request.parquet",
#     "hf://datasets/hao-li/AIDev/pull_request.parquet",
# ]
# repositories = [
#     "hf://datasets/hao-li/AIDev/all_repository.parquet",
#     "hf://datasets/hao-li/AIDev/repository.parquet",
# ]
# reviews = [
#     "hf://datasets/hao-li/AIDev/all_pr_reviews.parquet",
#     "hf://datasets/hao-li/AIDev/pr_reviews.parquet",
# ]
# timeout_secs = 600

[output]
# dir = "."

[text]
# "remove" deletes HTML tags, "space" replaces each tag with a space
# tag_replacement = "remove"
# review_tag_replacement = "space"

[bots]
# Extra rules on top of the built-in bot logins and -bot/_bot suffixes
# extra_logins = ["deploy-keeper"]
# extra_suffixes = ["-ci"]
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReflensConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".reflens.toml");
            if default_path.exists() {
                ReflensConfig::from_file(default_path)?
            } else {
                ReflensConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    init_tracing(cli.verbose, use_color);

    let out_dir = cli.out_dir.clone().unwrap_or_else(|| config.output.dir.clone());
    if cli.verbose {
        tracing::debug!(format = %cli.format, out_dir = %out_dir.display(), "resolved settings");
    }

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Prs) => {
            let loader = SourceLoader::new(&config.sources)?;
            let report = prs_command(&loader, &config, &out_dir).await?;
            emit(&report, cli.format, use_color)?;
        }
        Some(Command::Reviews) => {
            let loader = SourceLoader::new(&config.sources)?;
            let report = reviews_command(&loader, &config, &out_dir).await?;
            emit(&report, cli.format, use_color)?;
        }
        Some(Command::Split { input }) => {
            let input = input.unwrap_or_else(|| out_dir.join(REVIEWS_FILE));
            let report = split_command(&config, input, &out_dir)?;
            emit(&report, cli.format, use_color)?;
        }
        Some(Command::Unique { input, output }) => {
            let input = input.unwrap_or_else(|| out_dir.join(BOT_REVIEWS_FILE));
            let output = output.unwrap_or_else(|| out_dir.join(UNIQUE_BOTS_FILE));
            let report = unique_command(input, output)?;
            emit(&report, cli.format, use_color)?;
        }
        Some(Command::Run) => {
            let loader = SourceLoader::new(&config.sources)?;
            let reviews = reviews_command(&loader, &config, &out_dir).await?;
            let split = split_command(&config, reviews.output.clone(), &out_dir)?;
            let unique = unique_command(
                split.bots_output.clone(),
                out_dir.join(UNIQUE_BOTS_FILE),
            )?;
            emit(
                &RunReport {
                    reviews,
                    split,
                    unique,
                },
                cli.format,
                use_color,
            )?;
        }
        Some(Command::Init) => {
            let path = Path::new(".reflens.toml");
            if path.exists() {
                miette::bail!(".reflens.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .reflens.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "reflens", &mut std::io::stdout());
        }
    }

    Ok(())
}
