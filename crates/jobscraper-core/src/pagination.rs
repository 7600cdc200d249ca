use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::Job;
use crate::traits::{Scraper, SourceFetcher};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Drives a [`SourceFetcher`] page by page.
///
/// For each page: fetch the listing, then fetch every item's detail. A failed
/// listing or detail request is logged and skipped. A listing with fewer raw
/// items than `page_size` is treated as the last page. Cancellation is checked
/// before each page and ends the scrape with whatever was collected so far.
#[derive(Debug, Clone)]
pub struct PaginatedScraper<F> {
    name: String,
    fetcher: F,
    page_size: u32,
    max_pages: u32,
}

impl<F: SourceFetcher> PaginatedScraper<F> {
    pub fn new(name: impl Into<String>, fetcher: F) -> Self {
        Self {
            name: name.into(),
            fetcher,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Page cap used by [`Scraper::scrape`].
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    async fn collect_pages(&self, pages: u32, cancel: &CancellationToken) -> Vec<Job> {
        let mut jobs = Vec::new();

        for page in 1..=pages {
            if cancel.is_cancelled() {
                tracing::info!(scraper = %self.name, page, "Scrape cancelled");
                break;
            }

            let listing = match self.fetcher.fetch_listing(page, self.page_size).await {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!(scraper = %self.name, page, error = %e, "Listing page failed, skipping");
                    continue;
                }
            };
            tracing::debug!(
                scraper = %self.name,
                page,
                items = listing.item_ids.len(),
                raw = listing.raw_count,
                "Fetched listing page"
            );

            for item_id in &listing.item_ids {
                match self.fetcher.fetch_job(item_id).await {
                    Ok(job) => jobs.push(job),
                    Err(e) => {
                        tracing::warn!(scraper = %self.name, %item_id, error = %e, "Job detail failed, skipping");
                    }
                }
            }

            if listing.raw_count < self.page_size as usize {
                tracing::debug!(scraper = %self.name, page, "Short page, source exhausted");
                break;
            }
        }

        tracing::info!(scraper = %self.name, jobs = jobs.len(), "Scrape finished");
        jobs
    }
}

impl<F: SourceFetcher> Scraper for PaginatedScraper<F> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, cancel: &CancellationToken) -> Result<Vec<Job>, AppError> {
        Ok(self.collect_pages(self.max_pages, cancel).await)
    }

    async fn scrape_pages(
        &self,
        pages: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Job>, AppError> {
        Ok(self.collect_pages(pages, cancel).await)
    }
}
