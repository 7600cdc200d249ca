use std::path::PathBuf;

use jobscraper_client::prompts::DEFAULT_PROMPTS_DIR;
use jobscraper_core::AppError;
use jobscraper_core::config::DEFAULT_CONFIG_PATH;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub api_key: String,
    pub sources_path: PathBuf,
    pub prompts_dir: PathBuf,
}

impl ServerConfig {
    /// Read `JOBSCRAPER_SERVER_API_KEY` (required), `JOBSCRAPER_SERVER_PORT`,
    /// `JOBSCRAPER_CONFIG` and `JOBSCRAPER_PROMPTS_DIR`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup("JOBSCRAPER_SERVER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError("JOBSCRAPER_SERVER_API_KEY must be set".into())
            })?;

        let port = match lookup("JOBSCRAPER_SERVER_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("Invalid JOBSCRAPER_SERVER_PORT '{raw}'"))
            })?,
        };

        Ok(Self {
            port,
            api_key,
            sources_path: lookup("JOBSCRAPER_CONFIG")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            prompts_dir: lookup("JOBSCRAPER_PROMPTS_DIR")
                .unwrap_or_else(|| DEFAULT_PROMPTS_DIR.to_string())
                .into(),
        })
    }
}
