use std::time::Duration;

use jobscraper_core::error::AppError;
use jobscraper_core::models::{Job, ListingPage};
use jobscraper_core::traits::SourceFetcher;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::http::map_send_error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_QUERY: &str = "software";

/// Fetches listing pages and job details from the jobs.ch public search API.
///
/// Listing: `GET {base}/public/search?page={p}&query={q}&rows={n}`.
/// Detail: `GET {base}/public/search/job/{id}`; the raw body becomes the job
/// description and the detail URL becomes the job URL.
#[derive(Debug, Clone)]
pub struct JobsChFetcher {
    client: Client,
    base_url: Url,
    query: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl JobsChFetcher {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| AppError::ConfigError(format!("invalid base_url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "base_url '{base_url}' cannot be used as a base"
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("jobscraper/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            query: DEFAULT_QUERY.to_string(),
            api_key: None,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Send `Authorization: Bearer <key>` on every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn listing_url(&self, page: u32, page_size: u32) -> Url {
        let mut url = self.endpoint(&["public", "search"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("query", &self.query)
            .append_pair("rows", &page_size.to_string());
        url
    }

    pub fn detail_url(&self, item_id: &str) -> Url {
        self.endpoint(&["public", "search", "job", item_id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor: the base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<String, AppError> {
        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
}

/// Parse a listing response into item ids.
///
/// Every document counts toward `raw_count`, even when it has no usable
/// `job_id`, so the last-page check reflects what the source returned.
pub fn parse_listing(body: &str) -> Result<ListingPage, AppError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ParseError(format!("invalid listing response: {e}")))?;

    let raw_count = response.documents.len();
    let item_ids = response
        .documents
        .iter()
        .filter_map(|doc| match doc.get("job_id") {
            Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => {
                tracing::warn!(document = %doc, "Listing document without job_id, skipping");
                None
            }
        })
        .collect();

    Ok(ListingPage {
        item_ids,
        raw_count,
    })
}

impl SourceFetcher for JobsChFetcher {
    async fn fetch_listing(&self, page: u32, page_size: u32) -> Result<ListingPage, AppError> {
        let url = self.listing_url(page, page_size);
        tracing::info!(page, "Fetching jobs.ch listing page");
        let body = self.get(url).await?;
        parse_listing(&body)
    }

    async fn fetch_job(&self, item_id: &str) -> Result<Job, AppError> {
        let url = self.detail_url(item_id);
        let body = self.get(url.clone()).await?;
        Ok(Job::raw(url.as_str(), body))
    }
}
