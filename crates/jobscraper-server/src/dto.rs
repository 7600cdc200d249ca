use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobscraper_core::instrument::OperationSnapshot;
use jobscraper_core::models::{Job, SourceStatus, TriggerReceipt};

pub const DEFAULT_JOB_LIMIT: usize = 20;
pub const MAX_JOB_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Scrapers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RunScraperQuery {
    /// Pages to scrape. Defaults to the source's `default_pages`, capped at `max_pages`.
    pub pages: Option<u32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunScraperResponse {
    pub message: String,
    pub scraper: String,
    pub pages: u32,
}

impl From<TriggerReceipt> for RunScraperResponse {
    fn from(receipt: TriggerReceipt) -> Self {
        Self {
            message: "Scraping job started".to_string(),
            scraper: receipt.source,
            pages: receipt.pages,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScraperStatusResponse {
    pub name: String,
    /// One of `Running`, `Completed`, `Failed`, `Cancelled`.
    pub status: String,
    /// Jobs persisted by the last run.
    pub jobs: usize,
}

impl From<SourceStatus> for ScraperStatusResponse {
    fn from(status: SourceStatus) -> Self {
        Self {
            name: status.name,
            status: status.status.to_string(),
            jobs: status.jobs,
        }
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListJobsQuery {
    pub limit: Option<usize>,
}

impl ListJobsQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_JOB_LIMIT).clamp(1, MAX_JOB_LIMIT)
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
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

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            url: job.url,
            title: job.title,
            description: job.description,
            company: job.company,
            location: job.location,
            employment_type: job.employment_type,
            posting_date: job.posting_date,
            expiration_date: job.expiration_date,
            is_active: job.is_active,
            job_categories: job.job_categories,
            must_skills: job.must_skills,
            optional_skills: job.optional_skills,
            salary: job.salary,
            years_of_experience: job.years_of_experience,
            education_level: job.education_level,
            benefits: job.benefits,
            company_size: job.company_size,
            work_culture: job.work_culture,
            remote: job.remote,
            languages: job.languages,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    /// Total stored jobs, not just this page.
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OperationResponse {
    pub component: String,
    pub target: String,
    pub operation: String,
    pub outcome: String,
    pub count: u64,
    pub total_ms: u64,
    pub max_ms: u64,
    pub items: u64,
}

impl From<OperationSnapshot> for OperationResponse {
    fn from(op: OperationSnapshot) -> Self {
        let outcome = match op.outcome {
            jobscraper_core::instrument::Outcome::Success => "success",
            jobscraper_core::instrument::Outcome::Error => "error",
        };
        Self {
            component: op.component,
            target: op.target,
            operation: op.operation,
            outcome: outcome.to_string(),
            count: op.count,
            total_ms: op.total_ms,
            max_ms: op.max_ms,
            items: op.items,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub operations: Vec<OperationResponse>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
