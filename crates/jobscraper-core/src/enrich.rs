use crate::error::AppError;
use crate::models::Job;
use crate::parser::parse_job;
use crate::traits::{CompletionClient, JobProcessor, PromptSource};

pub const DEFAULT_PROMPT_NAME: &str = "job_extraction";

const DESCRIPTION_PLACEHOLDER: &str = "{description}";

/// Enriches raw jobs by asking a text service to extract structured fields.
#[derive(Debug, Clone)]
pub struct LlmJobProcessor<C, P> {
    client: C,
    prompts: P,
    prompt_name: String,
}

impl<C: CompletionClient, P: PromptSource> LlmJobProcessor<C, P> {
    pub fn new(client: C, prompts: P) -> Self {
        Self {
            client,
            prompts,
            prompt_name: DEFAULT_PROMPT_NAME.to_string(),
        }
    }

    pub fn with_prompt_name(mut self, name: impl Into<String>) -> Self {
        self.prompt_name = name.into();
        self
    }
}

/// Fill the template's `{description}` placeholder, or append the
/// description when the template has none.
pub fn render_prompt(template: &str, description: &str) -> String {
    if template.contains(DESCRIPTION_PLACEHOLDER) {
        template.replace(DESCRIPTION_PLACEHOLDER, description)
    } else {
        format!("{}\n\n{}", template.trim_end(), description)
    }
}

impl<C: CompletionClient, P: PromptSource> JobProcessor for LlmJobProcessor<C, P> {
    async fn process(&self, job: &Job) -> Result<Job, AppError> {
        let template = self.prompts.get_prompt(&self.prompt_name)?;
        let prompt = render_prompt(&template, &job.description);

        tracing::debug!(url = %job.url, prompt_len = prompt.len(), "Requesting enrichment");
        let reply = self.client.complete(&prompt).await?;

        let mut enriched = parse_job(&reply)?;
        if enriched.description.trim().is_empty() {
            enriched.description = job.description.clone();
        }
        Ok(enriched)
    }
}
