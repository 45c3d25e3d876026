use std::sync::Arc;

use matchfinder_matches::config::AppConfig;
use matchfinder_matches::store::Store;
use matchfinder_matches::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    matchfinder_shared::middleware::init_tracing("matchfinder-matches");

    let config = AppConfig::load()?;
    let port = config.port;
    tracing::info!(storage = ?config.storage, port, "configuration loaded");

    let store = Store::connect(&config)?;

    let mut state = AppState::new(store, config);
    match matchfinder_shared::middleware::init_metrics() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed"),
    }

    let app = matchfinder_matches::app(Arc::new(state));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "matchfinder-matches starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
