use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobscraper_client::{LlmConfig, build_processor, build_runner};
use jobscraper_core::config::SourcesFile;
use jobscraper_core::cron::CronSchedule;
use jobscraper_core::instrument::Metrics;
use jobscraper_core::models::RunStatus;
use jobscraper_core::traits::JobStore;
use jobscraper_db::{Database, DatabaseConfig, PgJobStore};

#[derive(Parser)]
#[command(name = "jobscraper", version, about = "Job posting scraper with LLM enrichment")]
struct Cli {
    /// Scraper configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "JOBSCRAPER_CONFIG",
        default_value = "config/scrapers.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scrape to completion and print the run result
    Scrape {
        /// Source name from the configuration file
        #[arg(short, long)]
        source: String,

        /// Pages to fetch (defaults to the source's default_pages)
        #[arg(short, long)]
        pages: Option<u32>,

        /// Directory holding prompt templates
        #[arg(long, env = "JOBSCRAPER_PROMPTS_DIR", default_value = "prompts")]
        prompts_dir: PathBuf,
    },

    /// Print stored jobs, newest first
    Jobs {
        /// Number of jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List configured sources and their schedules
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscraper=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            source,
            pages,
            prompts_dir,
        } => {
            let sources = load_sources(&cli.config)?;
            let store = connect_db().await?;
            cmd_scrape(store, &sources, &source, pages, prompts_dir).await?;
        }
        Commands::Jobs { limit } => {
            let store = connect_db().await?;
            cmd_jobs(&store, limit).await?;
        }
        Commands::Sources => {
            let sources = load_sources(&cli.config)?;
            cmd_sources(&sources)?;
        }
    }

    Ok(())
}

fn load_sources(path: &Path) -> Result<SourcesFile> {
    SourcesFile::load(path)
        .with_context(|| format!("Failed to load scraper configuration from {}", path.display()))
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<PgJobStore> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db.job_store())
}

async fn cmd_scrape(
    store: PgJobStore,
    sources: &SourcesFile,
    source: &str,
    pages: Option<u32>,
    prompts_dir: PathBuf,
) -> Result<()> {
    let processor = build_processor(LlmConfig::from_env()?, prompts_dir)?;
    let runner = Arc::new(build_runner(store, processor, sources, &Metrics::new())?);

    let interrupt = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling run");
                runner.shutdown().await;
            }
        })
    };

    let result = runner.run(source, pages).await;
    interrupt.abort();
    let result = result?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.status == RunStatus::Failed {
        anyhow::bail!(
            "Run failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn cmd_jobs(store: &PgJobStore, limit: usize) -> Result<()> {
    let jobs = store.list_jobs(limit).await?;
    let total = store.count_jobs().await?;

    eprintln!("Showing {} of {total} stored jobs", jobs.len());
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

fn cmd_sources(sources: &SourcesFile) -> Result<()> {
    if sources.scrapers.is_empty() {
        println!("No scrapers configured.");
        return Ok(());
    }

    println!(
        "{:<12} {:<24} {:>7} {:>5}  BASE URL",
        "NAME", "SCHEDULE (UTC)", "DEFAULT", "MAX"
    );
    for (name, settings) in &sources.scrapers {
        let schedule: CronSchedule = settings.schedule.parse()?;
        println!(
            "{:<12} {:<24} {:>7} {:>5}  {}",
            name, schedule, settings.default_pages, settings.max_pages, settings.base_url
        );
    }
    Ok(())
}
