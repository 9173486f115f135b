//! Error types for the web service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use safety_core::{ContentFlags, ModerationStatus, SafetyError, TransitionError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Missing x-user-id header")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Approved-content retrieval for a row that is not approved.
    #[error("Content not approved")]
    NotApproved {
        status: ModerationStatus,
        content_flags: ContentFlags,
    },

    /// The content checks blocked the request.
    #[error("{message}")]
    Blocked {
        message: String,
        violations: ContentFlags,
        metrics_id: String,
    },

    #[error("Generation failed: {0}")]
    Generation(#[from] SafetyError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] content_safety::ContentSafetyError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WebError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() })),
            WebError::Forbidden(_) => (StatusCode::FORBIDDEN, json!({ "error": self.to_string() })),
            WebError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            WebError::BadRequest(_) | WebError::Validation(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            WebError::Transition(TransitionError::Forbidden) => {
                (StatusCode::FORBIDDEN, json!({ "error": self.to_string() }))
            }
            WebError::Transition(_) => (StatusCode::CONFLICT, json!({ "error": self.to_string() })),
            WebError::NotApproved {
                status,
                content_flags,
            } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Content not approved",
                    "details": { "status": status, "contentFlags": content_flags },
                }),
            ),
            WebError::Blocked {
                message,
                violations,
                metrics_id,
            } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "violations": violations, "metrics_id": metrics_id }),
            ),
            WebError::Generation(err) => {
                tracing::error!("Generation error: {}", err);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Content generation failed" }))
            }
            WebError::Database(DatabaseError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{} not found: {}", entity, id) }),
            ),
            WebError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
            WebError::Metrics(err) => {
                tracing::error!("Metrics error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, WebError>;
