use std::sync::Arc;

use dashmap::DashMap;

use crate::models::{RunResult, SourceStatus};

/// Latest run result per source.
///
/// Cheap to clone; all clones share the same map. Writes are last-writer-wins,
/// so two overlapping runs of one source can overwrite each other's entry.
/// Compare `run_id` to tell which run an entry belongs to.
#[derive(Debug, Clone, Default)]
pub struct RunStatusRegistry {
    runs: Arc<DashMap<String, RunResult>>,
}

impl RunStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &RunResult) {
        self.runs.insert(result.source.clone(), result.clone());
    }

    pub fn get(&self, source: &str) -> Option<RunResult> {
        self.runs.get(source).map(|entry| entry.value().clone())
    }

    /// One row per source that has run at least once, sorted by name.
    pub fn statuses(&self) -> Vec<SourceStatus> {
        let mut statuses: Vec<SourceStatus> = self
            .runs
            .iter()
            .map(|entry| SourceStatus {
                name: entry.key().clone(),
                status: entry.value().status,
                jobs: entry.value().processed_jobs,
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
