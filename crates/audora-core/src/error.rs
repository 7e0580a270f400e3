//! Error types module
//!
//! All orchestrator errors are unified under the `AppError` enum: validation
//! and ownership failures, upstream storage/queue/database failures, polling
//! timeouts, and the unknown-broker-status case, which is always surfaced
//! loudly rather than swallowed.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so non-database crates can depend on this one without pulling sqlx.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like conflicts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SIZE_MISMATCH")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File size {size} out of range: must be between 1 and {max} bytes")]
    SizeOutOfRange { size: i64, max: i64 },

    #[error("File size mismatch: reported {reported} bytes, stored object is {actual} bytes")]
    SizeMismatch { reported: i64, actual: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Unknown broker status: {0}")]
    UnknownStatus(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// suggested_action, sensitive, log_level). Reduces duplication in the
/// ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Queue(_) => (
            502,
            "QUEUE_ERROR",
            true,
            Some("Retry job submission; the song record is preserved"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::SizeOutOfRange { .. } => (
            400,
            "SIZE_OUT_OF_RANGE",
            false,
            Some("Declared file size must be between 1 byte and 600 MiB"),
            false,
            LogLevel::Debug,
        ),
        AppError::SizeMismatch { .. } => (
            400,
            "SIZE_MISMATCH",
            false,
            Some("Re-upload the file, then retry completion with the stored size"),
            false,
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Use the account that initiated the upload"),
            false,
            LogLevel::Warn,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            false,
            Some("The operation was already applied; fetch current state instead"),
            false,
            LogLevel::Warn,
        ),
        AppError::Timeout(_) => (
            504,
            "TIMEOUT",
            true,
            Some("Switch to polling the processing status endpoint"),
            false,
            LogLevel::Warn,
        ),
        AppError::UnknownStatus(_) => (
            502,
            "UNKNOWN_STATUS",
            false,
            Some("Contact support; the worker returned an unrecognized status"),
            false,
            LogLevel::Error,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Provide a valid authenticated identity"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Queue(_) => "Queue",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::SizeOutOfRange { .. } => "SizeOutOfRange",
            AppError::SizeMismatch { .. } => "SizeMismatch",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Conflict(_) => "Conflict",
            AppError::Timeout(_) => "Timeout",
            AppError::UnknownStatus(_) => "UnknownStatus",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Queue(_) => "Failed to reach the processing queue".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::SizeOutOfRange { size, max } => {
                format!("File size {} out of range: must be between 1 and {} bytes", size, max)
            }
            AppError::SizeMismatch { reported, actual } => format!(
                "File size mismatch: reported {} bytes, stored object is {} bytes",
                reported, actual
            ),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::Timeout(ref msg) => msg.clone(),
            AppError::UnknownStatus(ref status) => {
                format!("Processing worker returned an unknown status: {}", status)
            }
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_size_mismatch() {
        let err = AppError::SizeMismatch {
            reported: 100,
            actual: 200,
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "SIZE_MISMATCH");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("100"));
        assert!(err.client_message().contains("200"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_conflict() {
        let err = AppError::Conflict("Upload session already completed".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "CONFLICT");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Upload session already completed");
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_error_metadata_timeout_is_recoverable() {
        let err = AppError::Timeout("task did not complete within 30s".to_string());
        assert_eq!(err.http_status_code(), 504);
        assert!(err.is_recoverable());
        assert_eq!(
            err.suggested_action(),
            Some("Switch to polling the processing status endpoint")
        );
    }

    #[test]
    fn test_error_metadata_unknown_status_logged_loudly() {
        let err = AppError::UnknownStatus("REBOOTING".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.client_message().contains("REBOOTING"));
    }
}
