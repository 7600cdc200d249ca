use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobscraper API",
        version = "0.2.0",
        description = "Scheduled job-posting acquisition with LLM enrichment."
    ),
    paths(
        crate::routes::run_scraper,
        crate::routes::scraper_status,
        crate::routes::list_jobs,
        crate::routes::metrics,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::RunScraperResponse,
        crate::dto::ScraperStatusResponse,
        crate::dto::JobResponse,
        crate::dto::JobListResponse,
        crate::dto::OperationResponse,
        crate::dto::MetricsResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "scrapers", description = "Manual runs and run status"),
        (name = "jobs", description = "Stored job postings"),
        (name = "system", description = "Health and metrics"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "API key. Set via JOBSCRAPER_SERVER_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
