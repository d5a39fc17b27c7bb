//! Error handling for the Livestock Stock Management Platform
//!
//! Every failure is reported upward in the `{ ok: false, errorMsg }` envelope
//! the client consumes; no error is fatal to the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or out-of-range required field. Recoverable: surfaced verbatim
    /// for correction.
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    /// Operation illegal for the record's current lifecycle state, e.g. a
    /// second sale of the same Stock.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A replenishment reference points at a missing Stock. Surfaced at write
    /// time, never silently dropped.
    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    /// The entity store did not answer within its bounded timeout. Distinct
    /// from validation/not-found so callers may retry.
    #[error("Store operation timed out")]
    StoreTimeout,

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Failure envelope: `{ "ok": false, "errorMsg": "..." }`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    #[serde(rename = "errorMsg")]
    pub error_msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_msg) = match &self {
            AppError::Validation { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, format!("{} not found", resource))
            }
            AppError::InvalidState(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::ReferentialIntegrity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            AppError::StoreTimeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The data store is not responding, please retry".to_string(),
            ),
            AppError::Upload(msg) => (StatusCode::BAD_REQUEST, format!("Upload failed: {}", msg)),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Configuration error: {}", msg),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            ),
        };

        tracing::error!("Error: {:?}", self);

        (
            status,
            Json(ErrorResponse {
                ok: false,
                error_msg,
            }),
        )
            .into_response()
    }
}

impl AppError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
