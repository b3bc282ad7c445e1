//! Remote store abstraction trait
//!
//! This module defines the RemoteStore trait that all store backends must implement.

use crate::query::{OnConflict, Query};
use crate::StoreBackend;
use async_trait::async_trait;
use crewboard_core::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Store operation errors
///
/// Transport failures and error payloads returned by the backend both end up here, so
/// callers only ever see "success with rows" or "failure with message".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Store responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    /// Network failures and 5xx responses can be retried as-is.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidQuery(msg) => AppError::InvalidInput(msg),
            StoreError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Store(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Tables of the hosted database used by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Clients,
    Applications,
    People,
    PersonEnrollments,
    DocumentStatus,
    TaskStatus,
    Invitations,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Applications => "applications",
            Table::People => "people",
            Table::PersonEnrollments => "person_enrollments",
            Table::DocumentStatus => "document_status",
            Table::TaskStatus => "task_status",
            Table::Invitations => "invitations",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Remote store abstraction trait
///
/// Rows travel as JSON objects; typed decoding happens in the repositories via
/// [`decode_rows`]. Implementations must be safe to share across tasks.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch rows matching `query`, honoring its order and range
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<serde_json::Value>>;

    /// Exact count of rows matching the filters of `query`; order and range are ignored
    async fn count(&self, table: Table, query: &Query) -> StoreResult<u64>;

    /// Insert one or more rows and return the inserted representation.
    ///
    /// With [`OnConflict::Ignore`], rows whose natural key already exists are skipped
    /// and are not part of the returned rows.
    async fn insert(
        &self,
        table: Table,
        rows: Vec<serde_json::Value>,
        on_conflict: &OnConflict,
    ) -> StoreResult<Vec<serde_json::Value>>;

    /// Get the store backend type
    fn backend_type(&self) -> StoreBackend;
}

/// Decode JSON rows into typed rows
pub fn decode_rows<T: DeserializeOwned>(
    table: Table,
    rows: Vec<serde_json::Value>,
) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| StoreError::Decode(format!("{} row: {}", table, e)))
        })
        .collect()
}

/// Encode typed insert payloads into JSON rows
pub fn encode_rows<T: Serialize>(rows: &[T]) -> StoreResult<Vec<serde_json::Value>> {
    rows.iter()
        .map(|row| {
            serde_json::to_value(row).map_err(|e| StoreError::InvalidQuery(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Transport("reset".into()).is_transient());
        assert!(StoreError::Status {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(!StoreError::Status {
            status: 400,
            message: "bad column".into()
        }
        .is_transient());
        assert!(!StoreError::Decode("x".into()).is_transient());
    }

    #[test]
    fn converts_into_app_error() {
        let err: AppError = StoreError::InvalidQuery("bad column".into()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err: AppError = StoreError::Transport("timeout".into()).into();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[test]
    fn decode_reports_table() {
        let rows = vec![serde_json::json!({"id": "not-a-uuid"})];
        let err = decode_rows::<crewboard_core::models::ClientRow>(Table::Clients, rows)
            .unwrap_err();
        assert!(err.to_string().contains("clients"));
    }
}
