use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A job posting.
///
/// Starts life as a *raw* job (only `url` and `description` set) produced by a
/// scraper, becomes *enriched* once the processor fills in the structured
/// fields, and is *persisted* once the store accepts it. `url` is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub url: String,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub posting_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub job_categories: Vec<String>,
    pub must_skills: Vec<String>,
    pub optional_skills: Vec<String>,
    pub salary: String,
    pub years_of_experience: i32,
    pub education_level: String,
    pub benefits: Vec<String>,
    pub company_size: i32,
    pub work_culture: String,
    pub remote: bool,
    pub languages: Vec<String>,
}

impl Job {
    /// A freshly scraped job with no structured fields.
    pub fn raw(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}

/// Result of one listing request: the item identifiers plus how many raw
/// documents the source returned (used for the last-page heuristic).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub item_ids: Vec<String>,
    pub raw_count: usize,
}

/// URLs already persisted when a run started.
///
/// Loaded once per run and never refreshed, so writes made later in the same
/// run are not visible here.
#[derive(Debug, Clone, Default)]
pub struct DedupSnapshot {
    urls: HashSet<String>,
}

impl DedupSnapshot {
    pub fn new(urls: HashSet<String>) -> Self {
        Self { urls }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Per-source schedule and paging limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Five-field cron expression (minute hour day-of-month month day-of-week).
    pub schedule: String,
    pub default_pages: u32,
    pub max_pages: u32,
}

impl ScraperConfig {
    pub fn validate(&self, source: &str) -> Result<(), AppError> {
        if self.default_pages == 0 || self.max_pages == 0 {
            return Err(AppError::ConfigError(format!(
                "invalid page configuration for scraper {source}: pages must be at least 1"
            )));
        }
        if self.default_pages > self.max_pages {
            return Err(AppError::ConfigError(format!(
                "default_pages ({}) cannot be greater than max_pages ({}) for scraper {source}",
                self.default_pages, self.max_pages
            )));
        }
        Ok(())
    }
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// Counters and status of a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub source: String,
    pub status: RunStatus,
    /// Raw jobs returned by the scraper.
    pub total_jobs: usize,
    /// Jobs enriched and saved.
    pub processed_jobs: usize,
    /// Jobs already present in the dedup snapshot.
    pub skipped_jobs: usize,
    /// Jobs dropped after an enrichment or persistence error.
    pub failed_jobs: usize,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunResult {
    pub fn started(source: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            status: RunStatus::Running,
            total_jobs: 0,
            processed_jobs: 0,
            skipped_jobs: 0,
            failed_jobs: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a terminal status. Ignored if the run already finished.
    pub(crate) fn finish(&mut self, status: RunStatus, error: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }
}

/// Row returned by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub status: RunStatus,
    pub jobs: usize,
}

/// Receipt for a run that was started in the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerReceipt {
    pub source: String,
    pub pages: u32,
}
