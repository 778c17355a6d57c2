//! API error handling.
//!
//! Every task-route failure is rendered as
//! `{success: false, code, message, timestamp}`. Store failures are logged in
//! full and answered with a generic message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dto::response_timestamp;
use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    pub timestamp: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            timestamp: response_timestamp(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(code, message))
    }

    /// Creates a 401 Unauthorized response.
    #[must_use]
    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiError::new(code, message))
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// Creates a 500 Internal Server Error response.
    #[must_use]
    pub fn internal_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new(code, message),
        )
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<RepositoryError> for ApiErrorResponse {
    fn from(error: RepositoryError) -> Self {
        tracing::error!(%error, "Task store operation failed");
        Self::internal_error("INTERNAL_ERROR", "An internal error occurred")
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        Self::bad_request("MALFORMED_BODY", rejection.body_text())
    }
}

// =============================================================================
// Task Validation Error
// =============================================================================

/// Input problems detected before the store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("Missing required fields")]
    MissingRequiredFields,

    #[error("Invalid date format")]
    InvalidDateFormat,

    /// Path identifier on get-one and delete.
    #[error("Invalid _id")]
    InvalidId,

    /// Path identifier on update.
    #[error("Invalid ID")]
    InvalidUpdateId,

    #[error("No Fields to update")]
    NoFieldsToUpdate,

    #[error("Title must not be empty")]
    EmptyTitle,
}

impl TaskValidationError {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
            Self::InvalidDateFormat => "INVALID_DATE_FORMAT",
            Self::InvalidId | Self::InvalidUpdateId => "INVALID_ID",
            Self::NoFieldsToUpdate => "NO_FIELDS_TO_UPDATE",
            Self::EmptyTitle => "EMPTY_TITLE",
        }
    }
}

impl From<TaskValidationError> for ApiErrorResponse {
    fn from(error: TaskValidationError) -> Self {
        Self::bad_request(error.code(), error.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
