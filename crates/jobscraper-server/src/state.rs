use std::sync::Arc;

use jobscraper_core::instrument::{InstrumentedStore, Metrics};
use jobscraper_core::runner::RunControl;
use jobscraper_db::{Database, PgJobStore};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub jobs: InstrumentedStore<PgJobStore>,
    pub runs: Arc<dyn RunControl>,
    pub metrics: Metrics,
    /// Bearer token required on every `/v1` route.
    pub api_key: String,
}
