//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Error bodies are JSON of the form `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::services::MailError;
use crate::workflow::WorkflowError;

/// Message returned for any failure after validation.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send donation email.";

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] MailError),

    /// Donor registry operation failed.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => Self::BadRequest(msg),
            WorkflowError::Send(e) => Self::Email(e),
            WorkflowError::Record(e) => Self::Registry(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Email(_) | Self::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Email(_) | Self::Registry(_) => SEND_FAILED_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;

    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_shows_message() {
        let (status, body) =
            body_json(AppError::BadRequest("email and soulmark are required fields.".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email and soulmark are required fields.");
    }

    #[tokio::test]
    async fn test_mail_failure_hides_details() {
        let (status, body) =
            body_json(AppError::Email(MailError::InvalidAddress("secret@relay".into()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SEND_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_registry_failure_maps_to_500() {
        let err = RegistryError::WriteFailed {
            location: "/srv/registry.json".to_string(),
            source: io::Error::other("disk full"),
        };
        let (status, body) = body_json(AppError::from(WorkflowError::Record(err))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SEND_FAILED_MESSAGE);
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::from(WorkflowError::Validation("nope".into()));
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "nope"));
    }
}
