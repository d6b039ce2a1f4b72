//! Error bodies returned by the task endpoints.
//!
//! Every failure leaves the server as `{code, message, details?}` JSON.
//! `details` is only present for validation failures and lists one entry per
//! rejected field. Extractor rejections and repository errors convert into
//! [`ApiErrorResponse`] so handlers can use `?` throughout.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// JSON error body.
///
/// `code` is one of `VALIDATION_ERROR`, `BAD_REQUEST`, `ID_MISMATCH`,
/// `NOT_FOUND`, `CONCURRENCY_CONFLICT` or `INTERNAL_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Rejected task fields, in `title`, `description`, `category` order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// A `VALIDATION_ERROR` body carrying the rejected fields.
    #[must_use]
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// One rejected task field, e.g. `{"field": "title", "message": "Title is required"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// camelCase name as it appears in the request body.
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// Error half of every task handler's `Result`.
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

    /// 400 for input that could not be parsed at all.
    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(code, message))
    }

    /// 400 for a task that parsed but breaks a field limit.
    #[must_use]
    pub fn validation_error(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation(message, details),
        )
    }

    /// 400 when the id in `PUT /tasks/{id}` differs from the body's `id`.
    #[must_use]
    pub fn id_mismatch() -> Self {
        Self::bad_request("ID_MISMATCH", "Task ID mismatch.")
    }

    /// 404 for a task id with no stored row.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// 409 for a write that lost a race with another writer.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ApiError::new("CONCURRENCY_CONFLICT", message),
        )
    }

    /// 500 with a generic message; the cause is only logged.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
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
        match error {
            RepositoryError::NotFound(message) => Self::not_found(message),
            RepositoryError::Validation(message) => {
                Self::validation_error(message, Vec::new())
            }
            RepositoryError::ConcurrencyConflict(message) => Self::conflict(message),
            RepositoryError::DatabaseError(_) => {
                tracing::error!(%error, "Repository operation failed");
                Self::internal_error("An internal error occurred")
            }
        }
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<PathRejection> for ApiErrorResponse {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field failures collected while checking a create or update body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// A failure of one field, as returned by `validate_title` and friends.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Appends the errors of `other`.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        Self::validation_error("Validation failed", error.errors)
    }
}

// =============================================================================
// Tests
// =============================================================================
