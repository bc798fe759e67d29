//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns the campaign name if the server is running. Does not check
/// dependencies.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "campaign": state.config().campaign.name,
    }))
}

/// Readiness health check endpoint.
///
/// Verifies the donor registry can be read. Returns 503 Service Unavailable
/// otherwise.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.registry().probe().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Registry not readable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
