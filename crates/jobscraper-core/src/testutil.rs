//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{Job, ListingPage, SourceStatus, TriggerReceipt};
use crate::pipeline::{RunEvent, RunReporter};
use crate::runner::RunControl;
use crate::traits::{
    CompletionClient, JobProcessor, JobStore, PromptSource, Scraper, SourceFetcher,
};

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Mock store with a fixed set of known URLs that records saves.
#[derive(Clone, Default)]
pub struct MockStore {
    pub saved: Arc<Mutex<Vec<Job>>>,
    existing: Arc<Mutex<HashSet<String>>>,
    existing_error: Arc<Mutex<Option<AppError>>>,
    failing_saves: Arc<Mutex<HashSet<String>>>,
}

impl MockStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_existing<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        let store = Self::default();
        store
            .existing
            .lock()
            .unwrap()
            .extend(urls.into_iter().map(str::to_string));
        store
    }

    /// Store whose URL snapshot fails once.
    pub fn with_existing_error(error: AppError) -> Self {
        let store = Self::default();
        *store.existing_error.lock().unwrap() = Some(error);
        store
    }

    /// Saving this URL fails as if it violated the unique constraint.
    pub fn failing_save(self, url: &str) -> Self {
        self.failing_saves.lock().unwrap().insert(url.to_string());
        self
    }

    pub fn saved_urls(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.url.clone())
            .collect()
    }
}

impl JobStore for MockStore {
    async fn get_existing_urls(&self) -> Result<HashSet<String>, AppError> {
        if let Some(e) = self.existing_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.existing.lock().unwrap().clone())
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        if self.failing_saves.lock().unwrap().contains(&job.url) {
            return Err(AppError::DatabaseError(format!(
                "duplicate key value violates unique constraint: {}",
                job.url
            )));
        }
        self.saved.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, AppError> {
        let saved = self.saved.lock().unwrap();
        Ok(saved.iter().rev().take(limit).cloned().collect())
    }

    async fn count_jobs(&self) -> Result<i64, AppError> {
        let known = self.existing.lock().unwrap().len();
        let saved = self.saved.lock().unwrap().len();
        Ok((known + saved) as i64)
    }
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Mock scraper returning a fixed job list.
///
/// Records every call: `Some(pages)` for `scrape_pages`, `None` for `scrape`.
#[derive(Clone)]
pub struct MockScraper {
    name: String,
    jobs: Arc<Mutex<Vec<Job>>>,
    error: Arc<Mutex<Option<AppError>>>,
    calls: Arc<Mutex<Vec<Option<u32>>>>,
    gate: Option<Arc<Notify>>,
}

impl MockScraper {
    pub fn new(name: &str, jobs: Vec<Job>) -> Self {
        Self {
            name: name.to_string(),
            jobs: Arc::new(Mutex::new(jobs)),
            error: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Scraper that fails once with `error`.
    pub fn with_error(name: &str, error: AppError) -> Self {
        let scraper = Self::new(name, Vec::new());
        *scraper.error.lock().unwrap() = Some(error);
        scraper
    }

    /// Block every scrape until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn page_calls(&self) -> Vec<Option<u32>> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, pages: Option<u32>) -> Result<Vec<Job>, AppError> {
        self.calls.lock().unwrap().push(pages);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.jobs.lock().unwrap().clone())
    }
}

impl Scraper for MockScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, _cancel: &CancellationToken) -> Result<Vec<Job>, AppError> {
        self.respond(None).await
    }

    async fn scrape_pages(
        &self,
        pages: u32,
        _cancel: &CancellationToken,
    ) -> Result<Vec<Job>, AppError> {
        self.respond(Some(pages)).await
    }
}

// ---------------------------------------------------------------------------
// MockSourceFetcher
// ---------------------------------------------------------------------------

/// Mock listing source.
///
/// Page `p` (1-based) lists `sizes[p - 1]` items with ids `p{p}-{i}`; pages
/// beyond the list are empty. Details resolve to `https://jobs.test/{id}`.
#[derive(Clone, Default)]
pub struct MockSourceFetcher {
    sizes: Vec<usize>,
    failing_pages: Arc<Mutex<HashSet<u32>>>,
    failing_items: Arc<Mutex<HashSet<String>>>,
    listing_calls: Arc<Mutex<Vec<u32>>>,
}

impl MockSourceFetcher {
    pub fn with_page_sizes(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            ..Default::default()
        }
    }

    pub fn failing_page(self, page: u32) -> Self {
        self.failing_pages.lock().unwrap().insert(page);
        self
    }

    pub fn failing_item(self, item_id: &str) -> Self {
        self.failing_items
            .lock()
            .unwrap()
            .insert(item_id.to_string());
        self
    }

    pub fn listing_calls(&self) -> Vec<u32> {
        self.listing_calls.lock().unwrap().clone()
    }
}

impl SourceFetcher for MockSourceFetcher {
    async fn fetch_listing(&self, page: u32, _page_size: u32) -> Result<ListingPage, AppError> {
        self.listing_calls.lock().unwrap().push(page);
        if self.failing_pages.lock().unwrap().contains(&page) {
            return Err(AppError::HttpError(format!("listing page {page} returned 500")));
        }

        let count = self
            .sizes
            .get(page as usize - 1)
            .copied()
            .unwrap_or_default();
        Ok(ListingPage {
            item_ids: (0..count).map(|i| format!("p{page}-{i}")).collect(),
            raw_count: count,
        })
    }

    async fn fetch_job(&self, item_id: &str) -> Result<Job, AppError> {
        if self.failing_items.lock().unwrap().contains(item_id) {
            return Err(AppError::HttpError(format!("detail {item_id} returned 404")));
        }
        Ok(Job::raw(
            format!("https://jobs.test/{item_id}"),
            format!("Detail body for {item_id}"),
        ))
    }
}

// ---------------------------------------------------------------------------
// MockProcessor
// ---------------------------------------------------------------------------

/// Mock processor that "enriches" by setting a title.
///
/// The returned job carries a bogus url so tests can check the orchestrator
/// replaces it.
#[derive(Clone, Default)]
pub struct MockProcessor {
    failing: Arc<Mutex<HashSet<String>>>,
    processed: Arc<Mutex<Vec<String>>>,
    cancel_after: Arc<Mutex<Option<(usize, CancellationToken)>>>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, url: &str) -> Self {
        self.failing.lock().unwrap().insert(url.to_string());
        self
    }

    /// Cancel `token` once `count` jobs have been processed.
    pub fn cancelling_after(self, count: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((count, token));
        self
    }

    pub fn processed_urls(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }
}

impl JobProcessor for MockProcessor {
    async fn process(&self, job: &Job) -> Result<Job, AppError> {
        let calls = {
            let mut processed = self.processed.lock().unwrap();
            processed.push(job.url.clone());
            processed.len()
        };

        if let Some((count, token)) = self.cancel_after.lock().unwrap().as_ref()
            && calls >= *count
        {
            token.cancel();
        }

        if self.failing.lock().unwrap().contains(&job.url) {
            return Err(AppError::ParseError(format!(
                "unparseable reply for {}",
                job.url
            )));
        }

        Ok(Job {
            url: "https://hallucinated.invalid/job".to_string(),
            title: format!("Enriched {}", job.url),
            description: job.description.clone(),
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------
// MockCompletion
// ---------------------------------------------------------------------------

/// Mock text service. Pops queued responses, then repeats the fallback reply.
#[derive(Clone)]
pub struct MockCompletion {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    fallback: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockCompletion {
    pub fn new(reply: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            fallback: reply.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        let client = Self::new("{}");
        client.responses.lock().unwrap().push(Err(error));
        client
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionClient for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fallback.clone())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockPromptSource
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockPromptSource {
    template: Option<String>,
}

impl MockPromptSource {
    pub fn new(template: &str) -> Self {
        Self {
            template: Some(template.to_string()),
        }
    }

    pub fn missing() -> Self {
        Self { template: None }
    }
}

impl PromptSource for MockPromptSource {
    fn get_prompt(&self, name: &str) -> Result<String, AppError> {
        self.template
            .clone()
            .ok_or_else(|| AppError::PromptError(format!("prompt {name} not found")))
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock run reporter that records event labels.
#[derive(Clone, Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunReporter for MockReporter {
    fn report(&self, event: RunEvent<'_>) {
        let label = match &event {
            RunEvent::Started { .. } => "started".to_string(),
            RunEvent::SnapshotLoaded { .. } => "snapshot_loaded".to_string(),
            RunEvent::Scraped { .. } => "scraped".to_string(),
            RunEvent::JobSkipped { .. } => "job_skipped".to_string(),
            RunEvent::JobSaved { .. } => "job_saved".to_string(),
            RunEvent::JobFailed { stage, .. } => format!("job_failed:{}", stage.as_str()),
            RunEvent::Finished { result } => format!("finished:{}", result.status),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ---------------------------------------------------------------------------
// MockRunControl
// ---------------------------------------------------------------------------

/// Recorded trigger: (source, pages).
pub type TriggerRecord = (String, Option<u32>);

/// Mock run control that records triggers instead of running anything.
#[derive(Clone, Default)]
pub struct MockRunControl {
    triggers: Arc<Mutex<Vec<TriggerRecord>>>,
    reject: bool,
}

impl MockRunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every trigger fails with `InvalidRequest`.
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn triggers(&self) -> Vec<TriggerRecord> {
        self.triggers.lock().unwrap().clone()
    }
}

impl RunControl for MockRunControl {
    fn trigger(&self, source: &str, pages: Option<u32>) -> Result<TriggerReceipt, AppError> {
        self.triggers
            .lock()
            .unwrap()
            .push((source.to_string(), pages));
        if self.reject {
            return Err(AppError::InvalidRequest("rejected".to_string()));
        }
        Ok(TriggerReceipt {
            source: source.to_string(),
            pages: pages.unwrap_or(1),
        })
    }

    fn statuses(&self) -> Vec<SourceStatus> {
        Vec::new()
    }

    fn sources(&self) -> Vec<String> {
        Vec::new()
    }
}
