use axum::routing::{delete, get, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use config::AppConfig;
use store::Store;

pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self { store, config, metrics: None }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/matches",
            get(routes::matches::list_matches).post(routes::matches::create_match),
        )
        .route("/matches/:id", delete(routes::matches::delete_match))
        .route("/matches/:id/join", put(routes::matches::join_match))
        .route("/matches/:id/leave", put(routes::matches::leave_match))
        .route("/matches/:id/participants", get(routes::matches::list_participants))
        .layer(axum::middleware::from_fn(
            matchfinder_shared::middleware::metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
