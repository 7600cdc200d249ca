//! Cron-driven run triggering.
//!
//! Each configured source gets one scheduled job per scheduler expression
//! (two when both of its day fields are restricted). A firing only asks the
//! [`RunControl`] to start a run; the run itself executes on its own task so a
//! slow run never delays the next firing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cron::CronSchedule;
use crate::error::AppError;
use crate::models::{ScraperConfig, TriggerReceipt};
use crate::runner::RunControl;

#[derive(Debug, Clone)]
struct ScheduledSource {
    cron: CronSchedule,
    pages: u32,
    job_ids: Vec<Uuid>,
}

/// Fires runs for every configured source on its cron schedule (UTC).
pub struct Scheduler {
    inner: JobScheduler,
    control: Arc<dyn RunControl>,
    schedules: BTreeMap<String, ScheduledSource>,
}

impl Scheduler {
    /// Parse every schedule, then register one job per source.
    ///
    /// Fails without registering anything if any expression is invalid.
    pub async fn new(
        control: Arc<dyn RunControl>,
        configs: &BTreeMap<String, ScraperConfig>,
    ) -> Result<Self, AppError> {
        let mut schedules = BTreeMap::new();
        for (name, config) in configs {
            config.validate(name)?;
            let cron = CronSchedule::parse(&config.schedule).map_err(|e| {
                AppError::ConfigError(format!("scraper {name}: {e}"))
            })?;
            schedules.insert(
                name.clone(),
                ScheduledSource {
                    cron,
                    pages: config.default_pages,
                    job_ids: Vec::new(),
                },
            );
        }

        let inner = JobScheduler::new().await?;
        for (name, entry) in &mut schedules {
            for expression in entry.cron.to_scheduler_expressions() {
                let job_control = Arc::clone(&control);
                let job_name = name.clone();
                let pages = entry.pages;

                let job = Job::new_async(expression.as_str(), move |_uuid, _lock| {
                    let control = Arc::clone(&job_control);
                    let name = job_name.clone();
                    Box::pin(async move {
                        let _ = fire(control.as_ref(), &name, pages);
                    })
                })?;
                entry.job_ids.push(inner.add(job).await?);
            }

            tracing::info!(
                source = %name,
                schedule = %entry.cron,
                pages = entry.pages,
                "Scheduled scraper"
            );
        }

        Ok(Self {
            inner,
            control,
            schedules,
        })
    }

    /// Source names with their normalized cron expression.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.schedules
            .iter()
            .map(|(name, entry)| (name.clone(), entry.cron.to_string()))
            .collect()
    }

    /// Earliest upcoming firing of `source`, as tracked by the job scheduler.
    pub async fn next_firing(&self, source: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        let entry = self
            .schedules
            .get(source)
            .ok_or_else(|| AppError::UnknownSource(source.to_string()))?;
        let mut inner = self.inner.clone();
        let mut next: Option<DateTime<Utc>> = None;
        for id in &entry.job_ids {
            if let Some(tick) = inner.next_tick_for_job(*id).await? {
                next = Some(next.map_or(tick, |current| current.min(tick)));
            }
        }
        Ok(next)
    }

    /// Start firing and block until `cancel` is triggered.
    ///
    /// Returning does not stop the schedule; call [`Scheduler::stop`].
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), AppError> {
        self.inner.start().await?;
        tracing::info!(sources = self.schedules.len(), "Scheduler started");
        cancel.cancelled().await;
        Ok(())
    }

    /// Halt all future firings. Runs already started keep going.
    pub async fn stop(&self) -> Result<(), AppError> {
        let mut inner = self.inner.clone();
        inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Fire `source` immediately, as if its schedule had just matched.
    pub fn fire_now(&self, source: &str) -> Result<TriggerReceipt, AppError> {
        let entry = self
            .schedules
            .get(source)
            .ok_or_else(|| AppError::UnknownSource(source.to_string()))?;
        fire(self.control.as_ref(), source, entry.pages)
    }
}

fn fire(control: &dyn RunControl, source: &str, pages: u32) -> Result<TriggerReceipt, AppError> {
    tracing::info!(%source, pages, "Scheduled firing");
    control.trigger(source, Some(pages)).inspect_err(|e| {
        tracing::error!(%source, error = %e, "Scheduled run could not be started");
    })
}
