//! Structured error types for engine and API responses.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing field or a violated outcome rule.
    ValidationError,
    /// The operation target does not exist.
    NotFound,
    /// Secret mismatch.
    Unauthorized,
    /// Duplicate category name, or category deletion blocked by tasks.
    Conflict,
    /// Underlying persistence failed.
    StorageFailure,
}

/// Structured error returned by every engine operation.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::ValidationError, format!("{} is required", field)).with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::ValidationError, reason).with_field(field)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {}", task_id))
    }

    pub fn category_not_found(category_id: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("Category not found: {}", category_id),
        )
    }

    pub fn category_exists(name: &str) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!("Category already exists: {}", name),
        )
        .with_field("name")
    }

    pub fn category_in_use(task_count: i64) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!(
                "This category has {} task(s). Please delete or reassign them first.",
                task_count
            ),
        )
        .with_details(task_count.to_string())
    }

    /// The same message for every credential failure.
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Unauthorized")
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageFailure, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Storage code returns anyhow errors; anything that is not already an ApiError
// came from persistence.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::storage(format!("{:#}", err)),
        }
    }
}

/// Result type for engine operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
