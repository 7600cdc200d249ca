use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobscraper_core::traits::JobStore;

use crate::auth::require_api_key;
use crate::dto::{
    HealthResponse, JobListResponse, JobResponse, ListJobsQuery, MetricsResponse,
    OperationResponse, RunScraperQuery, RunScraperResponse, ScraperStatusResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/scrapers/{name}/run", post(run_scraper))
        .route("/v1/scrapers/status", get(scraper_status))
        .route("/v1/jobs", get(list_jobs))
        .route("/v1/metrics", get(metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Scrapers
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/scrapers/{name}/run",
    params(
        ("name" = String, Path, description = "Scraper name from the sources file"),
        RunScraperQuery,
    ),
    responses(
        (status = 202, description = "Run started in the background", body = RunScraperResponse),
        (status = 400, description = "Invalid page count", body = crate::dto::ErrorResponse),
        (status = 404, description = "Unknown scraper", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "scrapers"
)]
pub async fn run_scraper(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RunScraperQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.runs.trigger(&name, query.pages)?;
    Ok((
        StatusCode::ACCEPTED,
        axum::Json(RunScraperResponse::from(receipt)),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/scrapers/status",
    responses(
        (status = 200, description = "Last run status per scraper", body = Vec<ScraperStatusResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "scrapers"
)]
pub async fn scraper_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let statuses: Vec<ScraperStatusResponse> = state
        .runs
        .statuses()
        .into_iter()
        .map(ScraperStatusResponse::from)
        .collect();
    axum::Json(statuses)
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Stored jobs, newest first", body = JobListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = state.jobs.list_jobs(query.limit()).await?;
    let total = state.jobs.count_jobs().await?;

    let response = JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/metrics",
    responses(
        (status = 200, description = "Per-operation counters and timings", body = MetricsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "system"
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let operations = state
        .metrics
        .snapshot()
        .into_iter()
        .map(OperationResponse::from)
        .collect();
    axum::Json(MetricsResponse { operations })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            "error"
        }
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
