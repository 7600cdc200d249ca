use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::AppError;
use crate::models::{RunResult, ScraperConfig, SourceStatus, TriggerReceipt};
use crate::pipeline::{RunReporter, ScraperService, TracingRunReporter};
use crate::registry::RunStatusRegistry;
use crate::traits::{JobProcessor, JobStore, Scraper};

/// Object-safe handle for starting runs by source name.
///
/// Used by the scheduler and the HTTP server so neither needs to know the
/// concrete store, processor, or scraper types.
pub trait RunControl: Send + Sync {
    /// Start a run in the background and return immediately.
    fn trigger(&self, source: &str, pages: Option<u32>) -> Result<TriggerReceipt, AppError>;

    /// Last known status of every source that has run.
    fn statuses(&self) -> Vec<SourceStatus>;

    /// Registered source names, sorted.
    fn sources(&self) -> Vec<String>;
}

struct RegisteredSource<S> {
    scraper: S,
    config: ScraperConfig,
}

/// Owns the named scrapers and spawns runs on a shared task tracker.
///
/// Runs for the same source are not serialized: two triggers in quick
/// succession produce two concurrent runs.
pub struct ScrapeRunner<St, P, S, R = TracingRunReporter>
where
    St: JobStore,
    P: JobProcessor,
    S: Scraper,
    R: RunReporter,
{
    service: Arc<ScraperService<St, P, R>>,
    sources: HashMap<String, RegisteredSource<S>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl<St, P, S, R> ScrapeRunner<St, P, S, R>
where
    St: JobStore + 'static,
    P: JobProcessor + 'static,
    S: Scraper + 'static,
    R: RunReporter + 'static,
{
    pub fn new(service: ScraperService<St, P, R>) -> Self {
        Self {
            service: Arc::new(service),
            sources: HashMap::new(),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Register a scraper under `name`. Rejects invalid page limits.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        scraper: S,
        config: ScraperConfig,
    ) -> Result<(), AppError> {
        let name = name.into();
        config.validate(&name)?;
        tracing::debug!(source = %name, schedule = %config.schedule, "Registered scraper");
        self.sources
            .insert(name, RegisteredSource { scraper, config });
        Ok(())
    }

    pub fn registry(&self) -> &RunStatusRegistry {
        self.service.registry()
    }

    /// Schedule and page limits for every registered source.
    pub fn configs(&self) -> BTreeMap<String, ScraperConfig> {
        self.sources
            .iter()
            .map(|(name, source)| (name.clone(), source.config.clone()))
            .collect()
    }

    /// Page count for a run: the default when absent, capped at `max_pages`.
    pub fn resolve_pages(&self, source: &str, pages: Option<u32>) -> Result<u32, AppError> {
        self.resolve(source, pages).map(|(_, pages)| pages)
    }

    fn resolve(&self, source: &str, pages: Option<u32>) -> Result<(&S, u32), AppError> {
        let registered = self
            .sources
            .get(source)
            .ok_or_else(|| AppError::UnknownSource(source.to_string()))?;
        let config = &registered.config;

        let pages = match pages {
            None => Ok(config.default_pages),
            Some(0) => Err(AppError::InvalidRequest(
                "pages must be at least 1".to_string(),
            )),
            Some(requested) if requested > config.max_pages => {
                tracing::info!(
                    %source,
                    requested,
                    max_pages = config.max_pages,
                    "Requested pages above limit, clamping"
                );
                Ok(config.max_pages)
            }
            Some(requested) => Ok(requested),
        }?;
        Ok((&registered.scraper, pages))
    }

    /// Run to completion on the current task.
    pub async fn run(&self, source: &str, pages: Option<u32>) -> Result<RunResult, AppError> {
        let (scraper, pages) = self.resolve(source, pages)?;
        Ok(self
            .service
            .execute_scraping(source, scraper, pages, &self.cancel)
            .await)
    }

    /// Wait for every spawned run to finish.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel in-flight runs and wait for them to record their final status.
    pub async fn shutdown(&self) {
        tracing::info!(in_flight = self.tracker.len(), "Stopping scrape runs");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl<St, P, S, R> RunControl for ScrapeRunner<St, P, S, R>
where
    St: JobStore + 'static,
    P: JobProcessor + 'static,
    S: Scraper + 'static,
    R: RunReporter + 'static,
{
    fn trigger(&self, source: &str, pages: Option<u32>) -> Result<TriggerReceipt, AppError> {
        let (scraper, pages) = self.resolve(source, pages)?;
        if self.cancel.is_cancelled() {
            return Err(AppError::InvalidRequest(
                "runner is shutting down".to_string(),
            ));
        }

        let service = Arc::clone(&self.service);
        let scraper = scraper.clone();
        let cancel = self.cancel.clone();
        let name = source.to_string();

        tracing::info!(%source, pages, "Triggering scrape run");
        self.tracker.spawn(async move {
            service
                .execute_scraping(&name, &scraper, pages, &cancel)
                .await;
        });

        Ok(TriggerReceipt {
            source: source.to_string(),
            pages,
        })
    }

    fn statuses(&self) -> Vec<SourceStatus> {
        self.registry().statuses()
    }

    fn sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }
}
