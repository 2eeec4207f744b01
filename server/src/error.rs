//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use canon_engine::{wire::ConflictResponse, ErrorKind};
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] canon_engine::Error),

    #[error("Base version {} is stale, head is {}", .0.base_version_id, .0.actual_version_id)]
    Conflict(ConflictResponse),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            // Clients decode this body directly.
            AppError::Conflict(conflict) => {
                tracing::info!(
                    base = %conflict.base_version_id,
                    actual = %conflict.actual_version_id,
                    "rejected stale push"
                );
                return (StatusCode::CONFLICT, Json(conflict)).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Engine(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::InvalidSnapshot => {
                    tracing::warn!("Rejected snapshot: {}", e);
                    (
                        StatusCode::BAD_REQUEST,
                        "Invalid snapshot".to_string(),
                        Some(e.to_string()),
                    )
                }
                _ => {
                    tracing::error!("Engine error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        None,
                    )
                }
            },
            AppError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                Some(reason.to_string()),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
