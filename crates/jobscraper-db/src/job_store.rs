use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jobscraper_core::error::AppError;
use jobscraper_core::models::Job;
use jobscraper_core::traits::JobStore;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, url, title, description, company, location, employment_type, \
     posting_date, expiration_date, is_active, job_categories, must_skills, optional_skills, \
     salary, years_of_experience, education_level, benefits, company_size, work_culture, \
     remote, languages, created_at";

/// PostgreSQL-backed [`JobStore`]. The `jobs.url` unique constraint is the
/// source of truth for deduplication across runs.
#[derive(Clone)]
pub struct PgJobStore {
    pool: Pool<Postgres>,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_save_error(e: sqlx::Error, url: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DatabaseError(format!("job already stored: {url}"))
        }
        _ => AppError::DatabaseError(e.to_string()),
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
#[allow(dead_code)]
struct JobRow {
    id: Uuid,
    url: String,
    title: String,
    description: String,
    company: String,
    location: String,
    employment_type: String,
    posting_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
    is_active: bool,
    job_categories: Vec<String>,
    must_skills: Vec<String>,
    optional_skills: Vec<String>,
    salary: String,
    years_of_experience: i32,
    education_level: String,
    benefits: Vec<String>,
    company_size: i32,
    work_culture: String,
    remote: bool,
    languages: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            url: row.url,
            title: row.title,
            description: row.description,
            company: row.company,
            location: row.location,
            employment_type: row.employment_type,
            posting_date: row.posting_date,
            expiration_date: row.expiration_date,
            is_active: row.is_active,
            job_categories: row.job_categories,
            must_skills: row.must_skills,
            optional_skills: row.optional_skills,
            salary: row.salary,
            years_of_experience: row.years_of_experience,
            education_level: row.education_level,
            benefits: row.benefits,
            company_size: row.company_size,
            work_culture: row.work_culture,
            remote: row.remote,
            languages: row.languages,
        }
    }
}

impl JobStore for PgJobStore {
    async fn get_existing_urls(&self) -> Result<HashSet<String>, AppError> {
        let urls: Vec<String> = sqlx::query_scalar("SELECT url FROM jobs")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(urls.into_iter().collect())
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                url, title, description, company, location, employment_type,
                posting_date, expiration_date, is_active, job_categories, must_skills,
                optional_skills, salary, years_of_experience, education_level, benefits,
                company_size, work_culture, remote, languages
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(&job.url)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.employment_type)
        .bind(job.posting_date)
        .bind(job.expiration_date)
        .bind(job.is_active)
        .bind(&job.job_categories)
        .bind(&job.must_skills)
        .bind(&job.optional_skills)
        .bind(&job.salary)
        .bind(job.years_of_experience)
        .bind(&job.education_level)
        .bind(&job.benefits)
        .bind(job.company_size)
        .bind(&job.work_culture)
        .bind(job.remote)
        .bind(&job.languages)
        .execute(&self.pool)
        .await
        .map_err(|e| map_save_error(e, &job.url))?;

        tracing::debug!(url = %job.url, "Job stored");
        Ok(())
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_jobs(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }
}
