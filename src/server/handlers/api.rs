//! Liveness endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::super::AppState;

/// Reports whether a scraper run is currently in progress.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "scraperRunning": state.orchestrator.is_running(),
    }))
}
