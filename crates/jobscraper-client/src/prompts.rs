use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use jobscraper_core::error::AppError;
use jobscraper_core::traits::PromptSource;

pub const DEFAULT_PROMPTS_DIR: &str = "prompts";

/// Prompt templates stored as `{dir}/{name}.txt`.
///
/// Each template is read from disk once and served from memory afterwards.
/// Clones share the cache. Failed reads are not cached.
#[derive(Debug, Clone)]
pub struct FilePromptRepository {
    base_dir: PathBuf,
    cache: Arc<DashMap<String, String>>,
}

impl FilePromptRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: Arc::new(DashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl PromptSource for FilePromptRepository {
    fn get_prompt(&self, name: &str) -> Result<String, AppError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(AppError::PromptError(format!("invalid prompt name: {name}")));
        }

        if let Some(template) = self.cache.get(name) {
            return Ok(template.clone());
        }

        let path = self.base_dir.join(format!("{name}.txt"));
        let template = std::fs::read_to_string(&path).map_err(|e| {
            AppError::PromptError(format!("error reading prompt file {}: {e}", path.display()))
        })?;
        tracing::debug!(prompt = name, path = %path.display(), "Loaded prompt template");
        self.cache.insert(name.to_string(), template.clone());
        Ok(template)
    }
}
