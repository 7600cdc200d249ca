mod http;

pub mod factory;
pub mod jobsch;
pub mod llm;
pub mod prompts;

pub use factory::{
    JobsChScraper, OpenAiJobProcessor, SourceScraper, build_processor, build_runner, build_scraper,
};
pub use jobsch::JobsChFetcher;
pub use llm::{LlmConfig, OpenAiCompletionClient};
pub use prompts::FilePromptRepository;
