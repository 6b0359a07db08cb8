//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The ticket-based report API
//! - Journal mutation routes (balance engine + approval gate)
//! - Health check

pub mod error;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use canebooks_core::jobs::JobStore;
use canebooks_core::pipeline::ReportScheduler;
use canebooks_core::storage::ArtifactStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Report job scheduler.
    pub scheduler: ReportScheduler,
    /// Job status store (polled by clients).
    pub jobs: Arc<JobStore>,
    /// Report artifact store.
    pub artifacts: Arc<ArtifactStore>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
