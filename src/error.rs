//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request failed validation before reaching the generation core
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A backend call exceeded its wall-clock time budget
    #[error("Backend call timed out after {0} seconds")]
    BackendTimeout(u64),

    /// The backend call failed or returned unusable output
    #[error("Backend error: {0}")]
    Backend(String),

    /// The caller aborted while queued at the gate or mid-pipeline
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::BackendTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Backend(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Cancelled(_) => (StatusCode::REQUEST_TIMEOUT, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
