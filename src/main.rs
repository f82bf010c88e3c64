mod cache;
mod config;
mod github;
mod index;
mod metrics;
mod report;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;

use cache::Cache;
use github::{
    Comment, Direction, Fetcher, GitHubError, HttpPageSource, Issue, IssueQuery, SortKey,
    StateFilter, DEFAULT_PAGE_SIZE,
};

/// Issue Report — fetches a repository's GitHub issues and comments and
/// reports activity counts and maintainer response statistics.
#[derive(Parser, Debug)]
#[command(name = "issue-report", version, about)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=issue_report=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query a repository for issues based on various parameters
    Query(QueryArgs),
    /// Run a report over all issues, reusing cached data when present
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct Filters {
    /// Repository as org/repo. Defaults to org and repo from the config file.
    path: Option<String>,

    /// Label to filter by (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Sort direction
    #[arg(long, value_enum, default_value_t)]
    direction: Direction,

    /// Only issues updated after the given time, ISO 8601: YYYY-MM-DDTHH:MM:SSZ
    #[arg(long)]
    since: Option<String>,

    /// Entries requested per page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    filters: Filters,

    #[arg(long, value_enum, default_value_t)]
    state: StateFilter,

    /// What to sort results by
    #[arg(long, value_enum, default_value_t)]
    sort: SortKey,

    /// Retrieve all issues matching the criteria, not just the first page
    #[arg(long)]
    all: bool,

    /// Exclude pull requests (filtered locally)
    #[arg(long)]
    no_pr: bool,

    /// Write issue_report.csv
    #[arg(long)]
    generate: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    filters: Filters,

    #[arg(long, value_enum, default_value_t)]
    format: report::OutputFormat,

    /// Write issue_summary_report.csv
    #[arg(long)]
    generate: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("issue_report=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        error!(error = %e, "run failed");
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading configuration");
    let config = config::Config::load()?;

    match command {
        Command::Query(args) => query(args, &config).await,
        Command::Report(args) => run_report(args, &config).await,
    }
}

async fn query(args: QueryArgs, config: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let repository = config.repository(args.filters.path.as_deref())?;
    let _span = info_span!("query", repository = %repository).entered();

    let query = IssueQuery {
        state: args.state,
        sort: args.sort,
        direction: args.filters.direction,
        since: args.filters.since,
        labels: args.filters.labels,
    };
    debug!(?query, "built query");

    let fetcher = Fetcher::new(HttpPageSource::new(config.token()), repository)
        .with_api_base(config.api_base())
        .with_page_size(args.filters.page_size);
    let mut issues: Vec<Issue> = fetcher.fetch(&query, args.all).await?;
    if args.no_pr {
        issues.retain(|issue| !issue.is_pull_request());
    }

    for issue in &issues {
        println!(
            "#{} [{}] {} ({})",
            issue.number.to_string().bold(),
            issue.state,
            issue.title,
            issue.author()
        );
    }

    if args.generate {
        write_csv(&issues, Path::new("issue_report.csv"))?;
    }
    Ok(())
}

async fn run_report(args: ReportArgs, config: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let repository = config.repository(args.filters.path.as_deref())?;
    let _span = info_span!("report", repository = %repository).entered();

    let query = IssueQuery {
        state: StateFilter::All,
        sort: SortKey::default(),
        direction: args.filters.direction,
        since: args.filters.since,
        labels: args.filters.labels,
    };
    debug!(?query, "built query");

    let cache = Cache::in_current_dir();
    let fetcher = Fetcher::new(HttpPageSource::new(config.token()), repository.clone())
        .with_api_base(config.api_base())
        .with_page_size(args.filters.page_size);

    let issues: Vec<Issue> = cache
        .load_or_fetch(|| async {
            let mut issues: Vec<Issue> = fetcher.fetch(&query, true).await?;
            issues.retain(|issue| !issue.is_pull_request());
            Ok::<_, GitHubError>(issues)
        })
        .await?;
    let comments: Vec<Comment> = cache
        .load_or_fetch(|| fetcher.fetch(&query, true))
        .await?;
    info!(issues = issues.len(), comments = comments.len(), "loaded collections");

    let now = chrono::Utc::now();
    let maintainers = config.maintainer_set();
    let lines = report::compose(&issues, &comments, maintainers.as_ref(), now);
    let built = report::build(&repository, lines, now);
    report::output(&built, args.format)?;

    if args.generate {
        write_csv(&issues, Path::new("issue_summary_report.csv"))?;
    }
    Ok(())
}

fn write_csv(issues: &[Issue], path: &Path) -> Result<(), report::ReportError> {
    report::write_csv(issues, path)?;
    info!(path = %path.display(), "report generated");
    eprintln!("Report generated at: {}", path.display());
    Ok(())
}
