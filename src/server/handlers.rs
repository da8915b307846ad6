// HTTP request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::engine::MonitoringEngine;
use crate::event::PredictionEvent;

/// Create the main application router
pub fn create_router(engine: Arc<MonitoringEngine>) -> Router {
    Router::new()
        .route("/v1/events", post(record_event))
        .route("/v1/snapshot", get(get_snapshot))
        .route("/v1/alerts/history", get(get_alert_history))
        .route("/health", get(health_check))
        .with_state(engine)
}

/// Handle POST /v1/events - the only ingestion entry point
async fn record_event(
    State(engine): State<Arc<MonitoringEngine>>,
    Json(event): Json<PredictionEvent>,
) -> Response {
    match engine.record(&event) {
        Ok(accepted) => (StatusCode::ACCEPTED, Json(accepted)).into_response(),
        Err(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": reason.to_string(),
                "rejection": reason,
            })),
        )
            .into_response(),
    }
}

/// Handle GET /v1/snapshot - current fully-evaluated health view
async fn get_snapshot(State(engine): State<Arc<MonitoringEngine>>) -> Response {
    Json(engine.snapshot()).into_response()
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    50
}

/// Handle GET /v1/alerts/history - bounded transitions, most recent first
async fn get_alert_history(
    State(engine): State<Arc<MonitoringEngine>>,
    Query(params): Query<HistoryParams>,
) -> Response {
    Json(engine.alert_history(params.limit)).into_response()
}

/// Handle GET /health - liveness plus a small config echo
async fn health_check(State(engine): State<Arc<MonitoringEngine>>) -> Response {
    let config = engine.config();
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "started_at": engine.started_at(),
        "bucket_span_secs": config.bucket_span_secs,
        "rollup_buckets": config.rollup_buckets,
        "rules": config.rules.len(),
    }))
    .into_response()
}
