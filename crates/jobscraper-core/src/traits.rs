use std::collections::HashSet;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{Job, ListingPage};

/// Persists and retrieves jobs.
pub trait JobStore: Send + Sync + Clone {
    /// Every URL currently stored. Used to build the per-run dedup snapshot.
    fn get_existing_urls(&self) -> impl Future<Output = Result<HashSet<String>, AppError>> + Send;

    /// Insert a job. Fails if the URL is already stored.
    fn save_job(&self, job: &Job) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Most recently stored jobs, newest first.
    fn list_jobs(&self, limit: usize) -> impl Future<Output = Result<Vec<Job>, AppError>> + Send;

    fn count_jobs(&self) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// Talks to one external listing source.
pub trait SourceFetcher: Send + Sync + Clone {
    /// Fetch one listing page (1-based) of item identifiers.
    fn fetch_listing(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<ListingPage, AppError>> + Send;

    /// Fetch the detail of one item as a raw job.
    fn fetch_job(&self, item_id: &str) -> impl Future<Output = Result<Job, AppError>> + Send;
}

/// Produces raw jobs for a named source.
///
/// Every scraper supports both a bounded and an unbounded scrape. Scrapers
/// with no notion of pages only implement [`Scraper::scrape`]; the default
/// [`Scraper::scrape_pages`] ignores the page count and delegates to it.
pub trait Scraper: Send + Sync + Clone {
    fn name(&self) -> &str;

    /// Scrape until the source is exhausted or the configured page cap is hit.
    fn scrape(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<Job>, AppError>> + Send;

    /// Scrape at most `pages` pages.
    fn scrape_pages(
        &self,
        pages: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<Job>, AppError>> + Send {
        let _ = pages;
        self.scrape(cancel)
    }
}

/// Turns a raw job into an enriched one.
pub trait JobProcessor: Send + Sync + Clone {
    fn process(&self, job: &Job) -> impl Future<Output = Result<Job, AppError>> + Send;
}

/// Single-turn text completion against an external text service.
pub trait CompletionClient: Send + Sync + Clone {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Looks up prompt templates by name.
pub trait PromptSource: Send + Sync + Clone {
    fn get_prompt(&self, name: &str) -> Result<String, AppError>;
}
