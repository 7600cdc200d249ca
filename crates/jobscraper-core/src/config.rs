//! Source table loaded from TOML.
//!
//! ```toml
//! [scrapers.jobsch]
//! base_url = "${JOBSCH_BASE_URL}"
//! schedule = "0 */6 * * *"
//! default_pages = 5
//! max_pages = 20
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::cron::CronSchedule;
use crate::error::AppError;
use crate::models::ScraperConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/scrapers.toml";

fn default_query() -> String {
    "software".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_pages() -> u32 {
    5
}

fn default_max_pages() -> u32 {
    20
}

/// Wiring and limits for one named source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub schedule: String,
    #[serde(default = "default_pages")]
    pub default_pages: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl SourceSettings {
    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            schedule: self.schedule.clone(),
            default_pages: self.default_pages,
            max_pages: self.max_pages,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub scrapers: BTreeMap<String, SourceSettings>,
}

impl SourcesFile {
    /// Read and validate a sources file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "Loading scraper configuration");
        Self::parse(&text)
    }

    /// Parse, expand `${VAR}` placeholders, and validate.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let mut file: SourcesFile = toml::from_str(text)
            .map_err(|e| AppError::ConfigError(format!("invalid scraper configuration: {e}")))?;

        for (name, settings) in file.scrapers.iter_mut() {
            settings.base_url = expand_env(&settings.base_url)?;
            if let Some(key) = settings.api_key.take() {
                let key = expand_env(&key)?;
                settings.api_key = (!key.is_empty()).then_some(key);
            }
            validate(name, settings)?;
        }

        Ok(file)
    }

    /// Schedule and page limits per source.
    pub fn scraper_configs(&self) -> BTreeMap<String, ScraperConfig> {
        self.scrapers
            .iter()
            .map(|(name, settings)| (name.clone(), settings.scraper_config()))
            .collect()
    }
}

fn validate(name: &str, settings: &SourceSettings) -> Result<(), AppError> {
    if settings.base_url.trim().is_empty() {
        return Err(AppError::ConfigError(format!(
            "required configuration field missing: scrapers.{name}.base_url"
        )));
    }
    if settings.page_size == 0 {
        return Err(AppError::ConfigError(format!(
            "page_size must be at least 1 for scraper {name}"
        )));
    }
    settings.scraper_config().validate(name)?;
    CronSchedule::parse(&settings.schedule).map_err(|e| {
        AppError::ConfigError(format!("invalid schedule format for scraper {name}: {e}"))
    })?;
    Ok(())
}

/// Replace a whole-value `${VAR}` placeholder with the variable's value.
fn expand_env(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    let Some(var) = trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(value.to_string());
    };

    std::env::var(var).map_err(|_| {
        AppError::ConfigError(format!("environment variable {var} is not set"))
    })
}
