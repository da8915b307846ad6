// HTTP daemon mode
// Serves ingestion and query endpoints for one shared engine instance

mod handlers;

pub use handlers::create_router;

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::MonitoringEngine;

/// Bind and serve until the process is stopped. The rotation task is
/// spawned separately in main; this only owns the HTTP surface.
pub async fn run_server(engine: Arc<MonitoringEngine>, config: &ServerConfig) -> Result<()> {
    let app = create_router(engine)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    tracing::info!(address = %config.bind_address, "Monitoring API listening");
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}
