//! Donation confirmation route handler.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::error::Result;
use crate::state::AppState;
use crate::workflow::DonationRequest;

/// Send the confirmation email for a verified donation and record it.
///
/// Responds `{"ok": true}` once the email has been sent. Registry write
/// failures only fail the request under the strict record policy. Bodies
/// that are not a JSON donation are answered with a 400 `{"error": ...}`.
#[instrument(skip_all)]
pub async fn confirm_donation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DonationRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload?;
    let receipt = state.workflow().run(request).await?;

    info!(recorded = receipt.record.is_some(), "Donation confirmed");
    Ok(Json(json!({ "ok": true })))
}
