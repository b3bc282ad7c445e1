//! Error types module
//!
//! This module provides the core error type used throughout Crewboard. Store failures,
//! tenant resolution misses, invalid arguments, and batch insert failures are all unified
//! under `AppError`, which also knows how it should be presented to an end user.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like partial batch inserts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error reporting - defines how an error should be presented.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the failed operation can simply be retried
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Human-readable message suitable for the error slot shown to end users
    fn client_message(&self) -> String;

    /// Whether details should be kept out of user-facing output
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Batch {batch} failed (rows {start}..{end}); {committed} rows committed before the failure: {message}"
    )]
    BatchInsertFailed {
        /// 1-based batch number
        batch: usize,
        /// First row index of the failed batch (inclusive)
        start: usize,
        /// Last row index of the failed batch (exclusive)
        end: usize,
        committed: usize,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
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

/// Static metadata for each variant: (error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, bool, LogLevel) {
    match err {
        AppError::Store(_) => (
            "STORE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Create a client or run the demo setup"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the arguments and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check environment variables"),
            false,
            LogLevel::Error,
        ),
        AppError::BatchInsertFailed { .. } => (
            "BATCH_INSERT_FAILED",
            true,
            Some("Re-run with --keep-existing to resume from the failed batch"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error output
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Store(_) => "Store",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Config(_) => "Config",
            AppError::BatchInsertFailed { .. } => "BatchInsertFailed",
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
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Store(_) => {
                "Failed to reach the data service. Please try again.".to_string()
            }
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Config(ref msg) => msg.clone(),
            AppError::BatchInsertFailed {
                batch,
                start,
                end,
                committed,
                ..
            } => format!(
                "Batch {} (records {}-{}) failed; {} records were saved before the failure",
                batch,
                start + 1,
                end,
                committed
            ),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Something went wrong while loading data".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_store() {
        let err = AppError::Store("HTTP 503: upstream unavailable".to_string());
        assert_eq!(err.error_code(), "STORE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(!err.client_message().contains("503"));
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("No clients available".to_string());
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "No clients available");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_batch_insert_failed() {
        let err = AppError::BatchInsertFailed {
            batch: 7,
            start: 600,
            end: 700,
            committed: 600,
            message: "timeout".to_string(),
        };
        assert_eq!(err.error_code(), "BATCH_INSERT_FAILED");
        assert!(err.is_recoverable());
        let msg = err.client_message();
        assert!(msg.contains("Batch 7"));
        assert!(msg.contains("601-700"));
        assert!(msg.contains("600 records"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("connection reset").context("count people");
        let err = AppError::from(source);
        let details = err.detailed_message();
        assert!(details.contains("Caused by"));
        assert_eq!(err.error_type(), "Internal");
    }
}
