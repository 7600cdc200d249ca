use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{DedupSnapshot, Job, RunResult, RunStatus};
use crate::registry::RunStatusRegistry;
use crate::traits::{JobProcessor, JobStore, Scraper};

/// Per-item stage at which a job was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Enrich,
    Save,
}

impl FailedStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedStage::Enrich => "enrich",
            FailedStage::Save => "save",
        }
    }
}

/// Events emitted during a run for monitoring/logging.
#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Started {
        run_id: Uuid,
        source: &'a str,
        pages: u32,
    },
    SnapshotLoaded {
        run_id: Uuid,
        known_urls: usize,
    },
    Scraped {
        run_id: Uuid,
        total_jobs: usize,
    },
    JobSkipped {
        run_id: Uuid,
        url: &'a str,
    },
    JobSaved {
        run_id: Uuid,
        url: &'a str,
    },
    JobFailed {
        run_id: Uuid,
        url: &'a str,
        stage: FailedStage,
        error: &'a str,
    },
    Finished {
        result: &'a RunResult,
    },
}

/// Trait for receiving run events (decoupled logging).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started {
                run_id,
                source,
                pages,
            } => {
                tracing::info!(%run_id, %source, pages, "Run started");
            }
            RunEvent::SnapshotLoaded { run_id, known_urls } => {
                tracing::debug!(%run_id, known_urls, "Dedup snapshot loaded");
            }
            RunEvent::Scraped { run_id, total_jobs } => {
                tracing::info!(%run_id, total_jobs, "Scrape returned jobs");
            }
            RunEvent::JobSkipped { run_id, url } => {
                tracing::info!(%run_id, %url, "Job already known, skipping");
            }
            RunEvent::JobSaved { run_id, url } => {
                tracing::debug!(%run_id, %url, "Job saved");
            }
            RunEvent::JobFailed {
                run_id,
                url,
                stage,
                error,
            } => {
                tracing::warn!(%run_id, %url, stage = stage.as_str(), %error, "Job dropped");
            }
            RunEvent::Finished { result } => match result.status {
                RunStatus::Failed => tracing::error!(
                    run_id = %result.run_id,
                    source = %result.source,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Run failed"
                ),
                status => tracing::info!(
                    run_id = %result.run_id,
                    source = %result.source,
                    %status,
                    total = result.total_jobs,
                    processed = result.processed_jobs,
                    skipped = result.skipped_jobs,
                    failed = result.failed_jobs,
                    "Run finished"
                ),
            },
        }
    }
}

/// Runs one acquire → dedup → enrich → persist cycle for a source.
///
/// The run only fails as a whole when the dedup snapshot or the scrape itself
/// fails. Per-job enrichment and save errors are counted and skipped.
pub struct ScraperService<St, P, R = TracingRunReporter>
where
    St: JobStore,
    P: JobProcessor,
    R: RunReporter,
{
    store: St,
    processor: P,
    registry: RunStatusRegistry,
    reporter: R,
}

impl<St, P> ScraperService<St, P, TracingRunReporter>
where
    St: JobStore,
    P: JobProcessor,
{
    pub fn new(store: St, processor: P, registry: RunStatusRegistry) -> Self {
        Self::with_reporter(store, processor, registry, TracingRunReporter)
    }
}

impl<St, P, R> ScraperService<St, P, R>
where
    St: JobStore,
    P: JobProcessor,
    R: RunReporter,
{
    pub fn with_reporter(store: St, processor: P, registry: RunStatusRegistry, reporter: R) -> Self {
        Self {
            store,
            processor,
            registry,
            reporter,
        }
    }

    pub fn registry(&self) -> &RunStatusRegistry {
        &self.registry
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Execute a run for `source`.
    ///
    /// `pages > 0` scrapes at most that many pages; `0` lets the scraper run
    /// until exhausted. The registry entry for `source` is overwritten at the
    /// start and at the end of the run.
    pub async fn execute_scraping<S: Scraper>(
        &self,
        source: &str,
        scraper: &S,
        pages: u32,
        cancel: &CancellationToken,
    ) -> RunResult {
        let mut result = RunResult::started(source);
        let run_id = result.run_id;
        self.registry.record(&result);
        self.reporter.report(RunEvent::Started {
            run_id,
            source,
            pages,
        });

        let snapshot = match self.store.get_existing_urls().await {
            Ok(urls) => DedupSnapshot::new(urls),
            Err(e) => {
                return self.finish(
                    result,
                    RunStatus::Failed,
                    Some(format!("failed to load existing job urls: {e}")),
                );
            }
        };
        self.reporter.report(RunEvent::SnapshotLoaded {
            run_id,
            known_urls: snapshot.len(),
        });

        let scraped = if pages > 0 {
            scraper.scrape_pages(pages, cancel).await
        } else {
            scraper.scrape(cancel).await
        };
        let raw_jobs = match scraped {
            Ok(jobs) => jobs,
            Err(e) => {
                return self.finish(
                    result,
                    RunStatus::Failed,
                    Some(format!("scraper {} failed: {e}", scraper.name())),
                );
            }
        };

        result.total_jobs = raw_jobs.len();
        self.reporter.report(RunEvent::Scraped {
            run_id,
            total_jobs: result.total_jobs,
        });

        // A scraper stopped by the token returns whatever it had, possibly nothing.
        if cancel.is_cancelled() {
            return self.finish(result, RunStatus::Cancelled, None);
        }

        for raw in &raw_jobs {
            if cancel.is_cancelled() {
                return self.finish(result, RunStatus::Cancelled, None);
            }

            if snapshot.contains(&raw.url) {
                result.skipped_jobs += 1;
                self.reporter.report(RunEvent::JobSkipped {
                    run_id,
                    url: &raw.url,
                });
                continue;
            }

            match self.process_one(raw).await {
                Ok(()) => {
                    result.processed_jobs += 1;
                    self.reporter.report(RunEvent::JobSaved {
                        run_id,
                        url: &raw.url,
                    });
                }
                Err((stage, error)) => {
                    result.failed_jobs += 1;
                    self.reporter.report(RunEvent::JobFailed {
                        run_id,
                        url: &raw.url,
                        stage,
                        error: &error,
                    });
                }
            }
        }

        self.finish(result, RunStatus::Completed, None)
    }

    async fn process_one(&self, raw: &Job) -> Result<(), (FailedStage, String)> {
        let mut enriched = self
            .processor
            .process(raw)
            .await
            .map_err(|e| (FailedStage::Enrich, e.to_string()))?;

        // The processor's url is never trusted; the scraped url is the key.
        enriched.url = raw.url.clone();

        self.store
            .save_job(&enriched)
            .await
            .map_err(|e| (FailedStage::Save, e.to_string()))
    }

    fn finish(&self, mut result: RunResult, status: RunStatus, error: Option<String>) -> RunResult {
        result.finish(status, error);
        self.registry.record(&result);
        self.reporter.report(RunEvent::Finished { result: &result });
        result
    }
}
