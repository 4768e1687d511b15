use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// `connected`, or `error: <detail>` when the store round trip fails.
    pub redis: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /health
/// Always 200: store failures are reported in the body, not the status.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let redis = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {e}"),
    };

    Json(HealthResponse {
        status: "healthy",
        redis,
        timestamp: Utc::now(),
    })
}
