use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use matchfinder_shared::errors::{AppError, AppResult};
use matchfinder_shared::types::api::HealthResponse;

use crate::AppState;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok("matchfinder-matches", env!("CARGO_PKG_VERSION")))
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> AppResult<String> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::not_found("metrics recorder not installed"))
}
