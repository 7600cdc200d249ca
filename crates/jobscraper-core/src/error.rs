use thiserror::Error;

/// Application-wide error types for jobscraper.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (listing page, job detail, or LLM endpoint).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// LLM API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// A reply from the text service could not be turned into a job.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Prompt template could not be loaded.
    #[error("Prompt error: {0}")]
    PromptError(String),

    /// Cron scheduler failed to start, stop, or register a firing.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    /// No scraper is registered under this name.
    #[error("Unknown scraper: {0}")]
    UnknownSource(String),

    /// A caller-supplied value was rejected.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Short, stable label used for metrics and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::HttpError(_) => "http_error",
            AppError::LlmError { .. } => "llm_error",
            AppError::ParseError(_) => "parse_error",
            AppError::SerializationError(_) => "serialization_error",
            AppError::Timeout(_) => "timeout",
            AppError::RateLimitExceeded => "rate_limit_exceeded",
            AppError::NetworkError(_) => "network_error",
            AppError::DatabaseError(_) => "database_error",
            AppError::ConfigError(_) => "config_error",
            AppError::PromptError(_) => "prompt_error",
            AppError::SchedulerError(_) => "scheduler_error",
            AppError::UnknownSource(_) => "unknown_source",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Generic(_) => "internal_error",
        }
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for AppError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        AppError::SchedulerError(err.to_string())
    }
}
