use std::path::PathBuf;

use jobscraper_core::config::{SourceSettings, SourcesFile};
use jobscraper_core::enrich::LlmJobProcessor;
use jobscraper_core::error::AppError;
use jobscraper_core::instrument::{InstrumentedScraper, Metrics};
use jobscraper_core::pagination::PaginatedScraper;
use jobscraper_core::pipeline::ScraperService;
use jobscraper_core::registry::RunStatusRegistry;
use jobscraper_core::runner::ScrapeRunner;
use jobscraper_core::traits::{JobProcessor, JobStore};

use crate::jobsch::JobsChFetcher;
use crate::llm::{LlmConfig, OpenAiCompletionClient};
use crate::prompts::FilePromptRepository;

/// Configuration key for the jobs.ch source.
pub const JOBSCH_SOURCE: &str = "jobsch";

/// Display name reported by the jobs.ch scraper.
pub const JOBSCH_NAME: &str = "Jobs.ch";

pub type JobsChScraper = PaginatedScraper<JobsChFetcher>;

/// Every configured source, wrapped for metrics.
pub type SourceScraper = InstrumentedScraper<JobsChScraper>;

pub type OpenAiJobProcessor = LlmJobProcessor<OpenAiCompletionClient, FilePromptRepository>;

/// Build the scraper registered under `name` in the sources file.
pub fn build_scraper(name: &str, settings: &SourceSettings) -> Result<JobsChScraper, AppError> {
    match name {
        JOBSCH_SOURCE => {
            let fetcher = JobsChFetcher::new(&settings.base_url)?
                .with_query(settings.query.clone())
                .with_api_key(settings.api_key.clone());
            Ok(PaginatedScraper::new(JOBSCH_NAME, fetcher)
                .with_page_size(settings.page_size)
                .with_max_pages(settings.max_pages))
        }
        other => Err(AppError::UnknownSource(other.to_string())),
    }
}

pub fn build_processor(
    config: LlmConfig,
    prompts_dir: impl Into<PathBuf>,
) -> Result<OpenAiJobProcessor, AppError> {
    let client = OpenAiCompletionClient::new(config)?;
    tracing::info!(model = client.model(), "Text service client ready");
    Ok(LlmJobProcessor::new(
        client,
        FilePromptRepository::new(prompts_dir),
    ))
}

/// Register every source in `sources` on a runner sharing one store and processor.
pub fn build_runner<St, P>(
    store: St,
    processor: P,
    sources: &SourcesFile,
    metrics: &Metrics,
) -> Result<ScrapeRunner<St, P, SourceScraper>, AppError>
where
    St: JobStore + 'static,
    P: JobProcessor + 'static,
{
    let service = ScraperService::new(store, processor, RunStatusRegistry::new());
    let mut runner = ScrapeRunner::new(service);
    for (name, settings) in &sources.scrapers {
        let scraper = InstrumentedScraper::new(build_scraper(name, settings)?, metrics.clone());
        runner.register(name.clone(), scraper, settings.scraper_config())?;
    }
    Ok(runner)
}
