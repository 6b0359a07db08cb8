//! Canebooks API Server
//!
//! Main entry point for the Canebooks backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canebooks_api::{AppState, create_router};
use canebooks_core::jobs::JobStore;
use canebooks_core::pipeline::ReportScheduler;
use canebooks_core::storage::ArtifactStore;
use canebooks_db::{ReportQueryRepository, connect};
use canebooks_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canebooks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = Arc::new(connect(&config.database).await?);
    info!("Connected to database");

    // Report pipeline wiring
    let jobs = Arc::new(JobStore::with_config(
        config.reports.job_capacity,
        config.reports.job_ttl_secs,
    ));
    let artifacts = Arc::new(
        ArtifactStore::local(&config.reports.artifact_root)
            .map_err(|e| anyhow::anyhow!("storage init failed: {e}"))?,
    );
    let source = Arc::new(ReportQueryRepository::new((*db).clone()));
    let scheduler = ReportScheduler::new(Arc::clone(&jobs), Arc::clone(&artifacts), source);
    info!(
        artifact_root = %config.reports.artifact_root,
        job_ttl_secs = config.reports.job_ttl_secs,
        "Report pipeline configured"
    );

    // Create application state
    let state = AppState {
        db,
        scheduler,
        jobs,
        artifacts,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
