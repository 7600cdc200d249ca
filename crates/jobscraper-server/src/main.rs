use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscraper_client::{LlmConfig, build_processor, build_runner};
use jobscraper_core::config::SourcesFile;
use jobscraper_core::instrument::{InstrumentedStore, Metrics};
use jobscraper_core::scheduler::Scheduler;
use jobscraper_db::{Database, DatabaseConfig};
use jobscraper_server::config::ServerConfig;
use jobscraper_server::routes;
use jobscraper_server::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscraper=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let sources = SourcesFile::load(&config.sources_path)?;

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let metrics = Metrics::new();
    let store = InstrumentedStore::new(db.job_store(), "postgres", metrics.clone());
    let processor = build_processor(LlmConfig::from_env()?, &config.prompts_dir)?;
    let runner = Arc::new(build_runner(store.clone(), processor, &sources, &metrics)?);

    let scheduler = Arc::new(Scheduler::new(runner.clone(), &runner.configs()).await?);
    let cancel = CancellationToken::new();
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.start(&cancel).await })
    };

    let state = Arc::new(AppState {
        db,
        jobs: store,
        runs: runner.clone(),
        metrics,
        api_key: config.api_key,
    });

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    scheduler_task.await??;
    scheduler.stop().await?;
    runner.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for CTRL+C");
            }
        }
        _ = cancel.cancelled() => {}
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
