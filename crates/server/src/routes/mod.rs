//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! POST /api/donation-email     - Confirm a donation (email, then record)
//! GET  /health                 - Liveness check with campaign name
//! GET  /health/ready           - Readiness check (registry readable)
//! ```

pub mod donation;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/donation-email", post(donation::confirm_donation))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
