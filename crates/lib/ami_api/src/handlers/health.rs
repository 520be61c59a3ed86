//! Health endpoint — bootstrap check.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub assistant_configured: bool,
    pub active_channels: usize,
}

/// `GET /api/health` — reports version, assistant key presence and open topics.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: ami_core::version(),
        assistant_configured: state.assistant.is_configured(),
        active_channels: state.hub.topic_count(),
    })
}
