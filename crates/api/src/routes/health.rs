//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    /// Report job tickets currently tracked.
    tracked_jobs: u64,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tracked_jobs: state.jobs.entry_count(),
    })
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
