//! Structured error type shared by the store, service and HTTP layers.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors
    ValidationFailed,
    BadRequest,
    Unauthenticated,

    // Not found errors
    TaskNotFound,
    SubtaskNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// Whether the error is the server's fault rather than the caller's.
    pub fn is_server_error(self) -> bool {
        matches!(self, ErrorCode::DatabaseError | ErrorCode::InternalError)
    }
}

/// Per-field validation messages, keyed by field path (`title`, `subtasks.0.title`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Structured error returned to callers.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Internal detail for logs; never sent to the caller.
    #[serde(skip)]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            errors: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    /// Build a validation error from `(field, message)` pairs in the order
    /// they were found. The headline message is the first one.
    pub fn validation(violations: Vec<(String, String)>) -> Self {
        let headline = match violations.len() {
            0 => "The given data was invalid.".to_string(),
            1 => violations[0].1.clone(),
            n => format!("{} (and {} more errors)", violations[0].1, n - 1),
        };
        let first_field = violations.first().map(|(field, _)| field.clone());

        let mut errors = FieldErrors::new();
        for (field, message) in violations {
            errors.entry(field).or_default().push(message);
        }

        let mut err = Self::new(ErrorCode::ValidationFailed, headline);
        err.field = first_field;
        err.errors = Some(errors);
        err
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthenticated(reason: &str) -> Self {
        Self::new(ErrorCode::Unauthenticated, format!("Unauthenticated: {}", reason))
    }

    pub fn task_not_found(task_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn subtask_not_found(subtask_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SubtaskNotFound,
            format!("Subtask not found: {}", subtask_id),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, "Database error").with_details(err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error").with_details(err.to_string())
    }
}

// Store functions return anyhow::Result and raise ApiError inside it.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => ApiError::database(sql_err),
                Err(err) => ApiError::internal(format!("{:#}", err)),
            },
        }
    }
}

/// Result type for service operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
