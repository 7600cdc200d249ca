use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use jobscraper_core::error::AppError;
use jobscraper_core::instrument::{InstrumentedStore, Metrics};
use jobscraper_core::models::{Job, ScraperConfig};
use jobscraper_core::pipeline::ScraperService;
use jobscraper_core::registry::RunStatusRegistry;
use jobscraper_core::runner::ScrapeRunner;
use jobscraper_core::traits::{JobProcessor, Scraper};
use jobscraper_db::{Database, PgJobStore};
use jobscraper_server::routes;
use jobscraper_server::state::AppState;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio_util::sync::CancellationToken;

pub const TEST_API_KEY: &str = "test-api-key-12345";

/// Returns a fixed list of raw jobs.
#[derive(Clone)]
pub struct FixedScraper {
    pub jobs: Vec<Job>,
}

impl Scraper for FixedScraper {
    fn name(&self) -> &str {
        "Fixed"
    }

    async fn scrape(&self, _cancel: &CancellationToken) -> Result<Vec<Job>, AppError> {
        Ok(self.jobs.clone())
    }
}

/// Fills in a title; fails for URLs containing "broken".
#[derive(Clone)]
pub struct TitleProcessor;

impl JobProcessor for TitleProcessor {
    async fn process(&self, job: &Job) -> Result<Job, AppError> {
        if job.url.contains("broken") {
            return Err(AppError::ParseError("unparseable reply".into()));
        }
        Ok(Job {
            title: format!("Title for {}", job.description),
            ..job.clone()
        })
    }
}

pub type TestRunner = ScrapeRunner<InstrumentedStore<PgJobStore>, TitleProcessor, FixedScraper>;

pub struct TestApp {
    pub router: Router,
    pub runner: Arc<TestRunner>,
    pub store: PgJobStore,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up PostgreSQL and build the app around a runner with one source, `fixed`.
///
/// The returned `TestApp` owns the container; dropping it stops the database.
pub async fn setup_test_app(scraped: Vec<Job>) -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobscraper_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/jobscraper_test");
    let pool = retry_connect(&url).await;

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");

    let metrics = Metrics::new();
    let store = InstrumentedStore::new(db.job_store(), "postgres", metrics.clone());
    let service = ScraperService::new(store.clone(), TitleProcessor, RunStatusRegistry::new());
    let mut runner = ScrapeRunner::new(service);
    runner
        .register(
            "fixed",
            FixedScraper { jobs: scraped },
            ScraperConfig {
                schedule: "0 * * * *".into(),
                default_pages: 1,
                max_pages: 3,
            },
        )
        .expect("Failed to register scraper");
    let runner = Arc::new(runner);

    let state = Arc::new(AppState {
        db: db.clone(),
        jobs: store,
        runs: runner.clone(),
        metrics,
        api_key: TEST_API_KEY.to_string(),
    });

    TestApp {
        router: routes::router(state),
        runner,
        store: db.job_store(),
        _container: container,
    }
}

pub fn raw_jobs(urls: &[&str]) -> Vec<Job> {
    urls.iter()
        .map(|url| Job::raw(*url, format!("desc {url}")))
        .collect()
}

pub fn urls(jobs: &[Job]) -> HashSet<String> {
    jobs.iter().map(|j| j.url.clone()).collect()
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}
