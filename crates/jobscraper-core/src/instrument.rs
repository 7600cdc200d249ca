//! Call counters and timings for storage and scraper calls.
//!
//! [`InstrumentedStore`] and [`InstrumentedScraper`] wrap any [`JobStore`] or
//! [`Scraper`] and forward every call unchanged, recording the outcome in a
//! shared [`Metrics`] registry.
//!
//! ```rust,ignore
//! let metrics = Metrics::new();
//! let store = InstrumentedStore::new(PgJobStore::new(pool), "postgres", metrics.clone());
//! let scraper = InstrumentedScraper::new(jobsch, metrics.clone());
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::Job;
use crate::traits::{JobStore, Scraper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

impl<T> From<&Result<T, AppError>> for Outcome {
    fn from(result: &Result<T, AppError>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Error
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct OperationKey {
    component: &'static str,
    target: String,
    operation: &'static str,
    outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default)]
struct OperationStats {
    count: u64,
    total: Duration,
    max: Duration,
    items: u64,
}

/// Snapshot of one (component, target, operation, outcome) series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSnapshot {
    pub component: String,
    pub target: String,
    pub operation: String,
    pub outcome: Outcome,
    pub count: u64,
    pub total_ms: u64,
    pub max_ms: u64,
    pub items: u64,
}

/// In-process metrics registry. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    series: Arc<DashMap<OperationKey, OperationStats>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        component: &'static str,
        target: &str,
        operation: &'static str,
        outcome: Outcome,
        elapsed: Duration,
        items: u64,
    ) {
        tracing::debug!(
            component,
            target,
            operation,
            ?outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            items,
            "Operation recorded"
        );

        let key = OperationKey {
            component,
            target: target.to_string(),
            operation,
            outcome,
        };
        let mut stats = self.series.entry(key).or_default();
        stats.count += 1;
        stats.total += elapsed;
        stats.max = stats.max.max(elapsed);
        stats.items += items;
    }

    /// All series, sorted by key.
    pub fn snapshot(&self) -> Vec<OperationSnapshot> {
        let mut entries: Vec<(OperationKey, OperationStats)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        entries
            .into_iter()
            .map(|(key, stats)| OperationSnapshot {
                component: key.component.to_string(),
                target: key.target,
                operation: key.operation.to_string(),
                outcome: key.outcome,
                count: stats.count,
                total_ms: stats.total.as_millis() as u64,
                max_ms: stats.max.as_millis() as u64,
                items: stats.items,
            })
            .collect()
    }
}

/// A [`JobStore`] that records every call in [`Metrics`].
#[derive(Debug, Clone)]
pub struct InstrumentedStore<S> {
    inner: S,
    target: String,
    metrics: Metrics,
}

impl<S: JobStore> InstrumentedStore<S> {
    pub fn new(inner: S, target: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            inner,
            target: target.into(),
            metrics,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        started: Instant,
        result: &Result<T, AppError>,
        items: u64,
    ) {
        self.metrics.record(
            "storage",
            &self.target,
            operation,
            Outcome::from(result),
            started.elapsed(),
            items,
        );
    }
}

impl<S: JobStore> JobStore for InstrumentedStore<S> {
    async fn get_existing_urls(&self) -> Result<HashSet<String>, AppError> {
        let started = Instant::now();
        let result = self.inner.get_existing_urls().await;
        let items = result.as_ref().map_or(0, |urls| urls.len() as u64);
        self.observe("get_existing_urls", started, &result, items);
        result
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        let started = Instant::now();
        let result = self.inner.save_job(job).await;
        let items = u64::from(result.is_ok());
        self.observe("save_job", started, &result, items);
        result
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, AppError> {
        let started = Instant::now();
        let result = self.inner.list_jobs(limit).await;
        let items = result.as_ref().map_or(0, |jobs| jobs.len() as u64);
        self.observe("list_jobs", started, &result, items);
        result
    }

    async fn count_jobs(&self) -> Result<i64, AppError> {
        let started = Instant::now();
        let result = self.inner.count_jobs().await;
        self.observe("count_jobs", started, &result, 0);
        result
    }
}

/// A [`Scraper`] that records every call in [`Metrics`].
#[derive(Debug, Clone)]
pub struct InstrumentedScraper<S> {
    inner: S,
    metrics: Metrics,
}

impl<S: Scraper> InstrumentedScraper<S> {
    pub fn new(inner: S, metrics: Metrics) -> Self {
        Self { inner, metrics }
    }

    fn observe(&self, operation: &'static str, started: Instant, result: &Result<Vec<Job>, AppError>) {
        let items = result.as_ref().map_or(0, |jobs| jobs.len() as u64);
        self.metrics.record(
            "scraper",
            self.inner.name(),
            operation,
            Outcome::from(result),
            started.elapsed(),
            items,
        );
    }
}

impl<S: Scraper> Scraper for InstrumentedScraper<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn scrape(&self, cancel: &CancellationToken) -> Result<Vec<Job>, AppError> {
        let started = Instant::now();
        let result = self.inner.scrape(cancel).await;
        self.observe("scrape", started, &result);
        result
    }

    async fn scrape_pages(
        &self,
        pages: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Job>, AppError> {
        let started = Instant::now();
        let result = self.inner.scrape_pages(pages, cancel).await;
        self.observe("scrape_pages", started, &result);
        result
    }
}
