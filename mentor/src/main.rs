//! MLOps Mentor
//!
//! Scrapes student project repositories on GitHub, scores them against a
//! rubric with an LLM and serves the results as a leaderboard.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod leaderboard;

#[cfg(test)]
mod test_utils;


use adapters::{GitHubClientImpl, OpenAiCompatibleClient, SqliteEvaluationRepository};
use app::{load_roster, EvaluatorService, LeaderboardService, ScrapeService, SnapshotService};
use config::Config;
use domain::entities::{Group, GroupId, RunId};
use handlers::AppState;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rubric-based LLM evaluation of MLOps course repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every group in the roster and store the results
    Scrape {
        /// Roster CSV (default: ROSTER_PATH or group_info.csv)
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// Groups evaluated at the same time
        #[arg(short, long, env = "CONCURRENCY")]
        concurrency: Option<usize>,

        /// Only evaluate these group numbers
        #[arg(short, long = "group")]
        groups: Vec<i32>,
    },

    /// Evaluate a single repository and print the result without storing it
    Evaluate {
        /// GitHub repository URL
        repo_url: String,
    },

    /// Show the leaderboard
    Leaderboard {
        /// Print the table instead of serving the dashboard
        #[arg(long)]
        print: bool,

        /// Dashboard port
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },
}

type Scraper = ScrapeService<GitHubClientImpl, OpenAiCompatibleClient, SqliteEvaluationRepository>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mentor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    // Connect to SQLite
    tracing::info!("Opening database {}", config.database_url);
    let db = adapters::sqlite::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteEvaluationRepository::new(db));

    match cli.command {
        Commands::Scrape {
            roster,
            concurrency,
            groups,
        } => {
            let roster = roster.unwrap_or_else(|| config.roster_path.clone());
            let concurrency = concurrency.unwrap_or(config.concurrency);
            scrape(&config, store, &roster, concurrency, &groups).await
        }
        Commands::Evaluate { repo_url } => evaluate(&config, store, repo_url).await,
        Commands::Leaderboard { print, port } => {
            let port = port.unwrap_or(config.port);
            show_leaderboard(store, print, port).await
        }
    }
}

fn build_scraper(config: &Config, store: Arc<SqliteEvaluationRepository>) -> Result<Scraper> {
    if config.github_token.is_none() {
        tracing::warn!("No GH_TOKEN set; GitHub allows only 60 unauthenticated requests per hour");
    }

    let github = Arc::new(
        GitHubClientImpl::new(
            config.github_api_url.clone(),
            config.github_token.clone(),
            config.http_timeout,
        )
        .context("Failed to build GitHub client")?,
    );

    let llm = Arc::new(
        OpenAiCompatibleClient::new(
            config.llm_provider,
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
            config.llm_timeout,
        )
        .context("Failed to build LLM client")?
        .with_json_mode(config.llm_json_mode),
    );
    tracing::info!(
        provider = %config.llm_provider,
        model = %config.llm_model,
        "LLM client ready"
    );

    let snapshots = Arc::new(SnapshotService::new(
        github,
        config.retry_policy(),
        config.snapshot_limits(),
    ));
    let evaluator = Arc::new(EvaluatorService::new(llm));

    Ok(ScrapeService::new(
        snapshots,
        evaluator,
        store,
        config.summary_budget_bytes,
    ))
}

async fn scrape(
    config: &Config,
    store: Arc<SqliteEvaluationRepository>,
    roster: &std::path::Path,
    concurrency: usize,
    only: &[i32],
) -> Result<()> {
    let mut groups = load_roster(roster)
        .await
        .with_context(|| format!("Failed to load roster {}", roster.display()))?;
    if !only.is_empty() {
        groups.retain(|g| only.contains(&g.id.0));
        if groups.is_empty() {
            bail!("None of the requested groups are in the roster");
        }
    }

    let scraper = build_scraper(config, store)?;
    let summary = scraper.run(&groups, concurrency).await?;

    println!(
        "Run {}: {} groups evaluated, {} with fallback scores",
        summary.run_id,
        summary.evaluated,
        summary.failed.len()
    );
    for (group, failures) in &summary.failed {
        let kinds: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
        println!("  group {}: {}", group, kinds.join(", "));
    }

    Ok(())
}

async fn evaluate(
    config: &Config,
    store: Arc<SqliteEvaluationRepository>,
    repo_url: String,
) -> Result<()> {
    let group = Group {
        id: GroupId(0),
        students: Vec::new(),
        repo_url,
    };

    let scraper = build_scraper(config, store)?;
    let record = scraper.evaluate_group(&group, RunId::new()).await?;

    println!("{}", leaderboard::render_group_detail(&record));
    Ok(())
}

async fn show_leaderboard(
    store: Arc<SqliteEvaluationRepository>,
    print: bool,
    port: u16,
) -> Result<()> {
    let service = Arc::new(LeaderboardService::new(store));

    if print {
        let rows = service.leaderboard().await?;
        print!("{}", leaderboard::render_table(&rows));
        return Ok(());
    }

    let app = handlers::router(AppState {
        leaderboard: service,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
