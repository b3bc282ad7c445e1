//! In-memory store backend
//!
//! Evaluates the full query contract against JSON rows held in process memory. Used by
//! `STORE_BACKEND=memory` demos and by the test suites of the downstream crates.

use crate::query::{OnConflict, Query};
use crate::traits::{RemoteStore, StoreError, StoreResult, Table};
use crate::StoreBackend;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Process-local store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<Table, Vec<Value>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows` in `table`, inserted as given
    pub fn with_rows(table: Table, rows: Vec<Value>) -> Self {
        let store = Self::new();
        store.seed(table, rows);
        store
    }

    /// Append rows verbatim, bypassing id/timestamp defaults and conflict checks
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.entry(table).or_default().extend(rows);
    }

    /// Number of rows currently stored in `table`
    pub fn len(&self, table: Table) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.get(&table).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }

    /// Remove every row of every table
    pub fn clear(&self) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.clear();
    }

    fn check_query(query: &Query) -> StoreResult<()> {
        match query.invalid_column() {
            Some(column) => Err(StoreError::InvalidQuery(format!(
                "Invalid column name: {:?}",
                column
            ))),
            None => Ok(()),
        }
    }
}

/// Natural key of `row` for the given conflict columns; `None` when any column is null.
fn natural_key(row: &Value, columns: &[String]) -> Option<Vec<String>> {
    columns
        .iter()
        .map(|c| match row.get(c) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        })
        .collect()
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        Self::check_query(query)?;

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Value> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        if !query.order.is_empty() {
            // Stable sort keeps insertion order among equal keys
            rows.sort_by(|a, b| query.compare_rows(a, b));
        }

        if let Some(range) = &query.range {
            let offset = usize::try_from(range.offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(range.limit).unwrap_or(usize::MAX);
            rows = rows.into_iter().skip(offset).take(limit).collect();
        }

        Ok(rows)
    }

    async fn count(&self, table: Table, query: &Query) -> StoreResult<u64> {
        Self::check_query(query)?;

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let count = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &OnConflict,
    ) -> StoreResult<Vec<Value>> {
        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object = match row {
                Value::Object(object) => object,
                other => {
                    return Err(StoreError::InvalidQuery(format!(
                        "{} insert expects JSON objects, got {}",
                        table, other
                    )))
                }
            };
            if object.get("id").map(Value::is_null).unwrap_or(true) {
                object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            if object.get("created_at").map(Value::is_null).unwrap_or(true) {
                object.insert("created_at".to_string(), Value::String(timestamp_now()));
            }
            prepared.push(Value::Object(object));
        }

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let existing = tables.entry(table).or_default();

        let written = match on_conflict {
            OnConflict::Error => {
                existing.extend(prepared.iter().cloned());
                prepared
            }
            OnConflict::Ignore(columns) => {
                let mut seen: HashSet<Vec<String>> = existing
                    .iter()
                    .filter_map(|row| natural_key(row, columns))
                    .collect();
                let inserted: Vec<Value> = prepared
                    .into_iter()
                    .filter(|row| match natural_key(row, columns) {
                        Some(key) => seen.insert(key),
                        None => true,
                    })
                    .collect();
                existing.extend(inserted.iter().cloned());
                inserted
            }
            OnConflict::Update(columns) => {
                let mut written = Vec::with_capacity(prepared.len());
                for row in prepared {
                    let stored = natural_key(&row, columns).and_then(|key| {
                        existing
                            .iter()
                            .position(|r| natural_key(r, columns).as_ref() == Some(&key))
                    });
                    match (stored, row) {
                        (Some(position), Value::Object(source)) => {
                            if let Value::Object(target) = &mut existing[position] {
                                for (column, value) in source {
                                    if column != "id" && column != "created_at" {
                                        target.insert(column, value);
                                    }
                                }
                            }
                            written.push(existing[position].clone());
                        }
                        (_, row) => {
                            existing.push(row.clone());
                            written.push(row);
                        }
                    }
                }
                written
            }
        };

        Ok(written)
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
