use std::time::Duration;

use jobscraper_core::error::AppError;
use jobscraper_core::traits::CompletionClient;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::map_send_error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_SYSTEM_PROMPT: &str = "You extract structured data from job postings. Respond ONLY with a single JSON object. Do not include explanations.";

/// Connection and sampling settings for the text service.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_LLM_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }

    /// Load from `JOBSCRAPER_*` environment variables.
    ///
    /// Required: `JOBSCRAPER_API_KEY`. Optional: `JOBSCRAPER_MODEL`,
    /// `JOBSCRAPER_BASE_URL`, `JOBSCRAPER_LLM_TIMEOUT_SECS`,
    /// `JOBSCRAPER_TEMPERATURE`, `JOBSCRAPER_MAX_TOKENS`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup("JOBSCRAPER_API_KEY")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::ConfigError("JOBSCRAPER_API_KEY not set".into()))?;
        let model = lookup("JOBSCRAPER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut config = Self::new(api_key, model);
        if let Some(base_url) = lookup("JOBSCRAPER_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "JOBSCRAPER_LLM_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(temperature) = parse_var::<f32>(&lookup, "JOBSCRAPER_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = parse_var::<u32>(&lookup, "JOBSCRAPER_MAX_TOKENS")? {
            config.max_tokens = max_tokens;
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AppError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::ConfigError(format!("{key} has an invalid value: {raw}"))),
    }
}

/// OpenAI-compatible chat-completions client.
///
/// Works with any endpoint that accepts `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    config: LlmConfig,
    system_prompt: Option<String>,
}

impl OpenAiCompletionClient {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            config: LlmConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }

    /// Replace the system message, or drop it with `None`.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
        }
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn error_from_status(status_code: u16, body: &str) -> AppError {
    if status_code == 429 {
        return AppError::RateLimitExceeded;
    }
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));
    AppError::LlmError {
        message,
        status_code,
    }
}

fn first_content(response: ChatResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::LlmError {
            message: "Empty response from LLM".into(),
            status_code: 200,
        })
}

impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = self.build_request(prompt);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout.as_secs()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_status(status.as_u16(), &body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {e}")))?;

        first_content(chat_response)
    }
}
