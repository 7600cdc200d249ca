pub mod config;
pub mod cron;
pub mod enrich;
pub mod error;
pub mod instrument;
pub mod models;
pub mod pagination;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AppError;
pub use models::{Job, RunResult, RunStatus, ScraperConfig, SourceStatus, TriggerReceipt};
pub use registry::RunStatusRegistry;
pub use runner::{RunControl, ScrapeRunner};
pub use traits::{CompletionClient, JobProcessor, JobStore, PromptSource, Scraper, SourceFetcher};
