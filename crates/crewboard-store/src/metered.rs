//! Call-counting store wrapper
//!
//! Counts every call per `(table, operation)` before delegating to the wrapped store.
//! The CLI prints these counts as query statistics, and tests use them to check that
//! loading a page costs a constant number of queries.

use crate::query::{OnConflict, Query};
use crate::traits::{RemoteStore, StoreResult, Table};
use crate::StoreBackend;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Select,
    Count,
    Insert,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Operation::Select => write!(f, "select"),
            Operation::Count => write!(f, "count"),
            Operation::Insert => write!(f, "insert"),
        }
    }
}

pub struct MeteredStore {
    inner: Arc<dyn RemoteStore>,
    calls: Mutex<BTreeMap<(Table, Operation), u64>>,
}

impl MeteredStore {
    pub fn new(inner: Arc<dyn RemoteStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    fn record(&self, table: Table, operation: Operation) {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        *calls.entry((table, operation)).or_insert(0) += 1;
    }

    /// Calls made for one table and operation
    pub fn calls(&self, table: Table, operation: Operation) -> u64 {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.get(&(table, operation)).copied().unwrap_or(0)
    }

    /// Calls made across all tables and operations
    pub fn total(&self) -> u64 {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.values().sum()
    }

    /// Calls of `operation` across all tables
    pub fn total_for(&self, operation: Operation) -> u64 {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls
            .iter()
            .filter(|((_, op), _)| *op == operation)
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn snapshot(&self) -> BTreeMap<(Table, Operation), u64> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[async_trait]
impl RemoteStore for MeteredStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        self.record(table, Operation::Select);
        self.inner.select(table, query).await
    }

    async fn count(&self, table: Table, query: &Query) -> StoreResult<u64> {
        self.record(table, Operation::Count);
        self.inner.count(table, query).await
    }

    async fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &OnConflict,
    ) -> StoreResult<Vec<Value>> {
        self.record(table, Operation::Insert);
        self.inner.insert(table, rows, on_conflict).await
    }

    fn backend_type(&self) -> StoreBackend {
        self.inner.backend_type()
    }
}
