//! REST store backend
//!
//! Talks to a PostgREST-style interface (`/rest/v1/{table}`) of the hosted database.
//! Filters are encoded as query parameters, counts use `HEAD` with `Prefer: count=exact`
//! and are read back from the `Content-Range` header.

use crate::query::{Direction, Filter, OnConflict, Query};
use crate::traits::{RemoteStore, StoreError, StoreResult, Table};
use crate::StoreBackend;
use async_trait::async_trait;
use crewboard_core::Config;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const REST_PREFIX: &str = "/rest/v1";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Characters that force a filter value to be double-quoted
const RESERVED: &[char] = &[',', '(', ')', '.', ':', '"', '\\', ' '];

/// Error payload returned by the backend alongside a non-2xx status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

/// Remote store over the hosted database's REST interface
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let url = config.store_url.as_deref().ok_or_else(|| {
            StoreError::ConfigError("STORE_URL (or SUPABASE_URL) not configured".to_string())
        })?;
        let key = config.store_api_key.as_deref().ok_or_else(|| {
            StoreError::ConfigError("STORE_API_KEY (or SUPABASE_ANON_KEY) not configured".to_string())
        })?;

        Self::new(url, key, Duration::from_secs(config.store_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}{}/{}", self.base_url, REST_PREFIX, table.as_str())
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            message: normalize_error_body(&body, status.canonical_reason()),
        })
    }
}

/// Render a scalar as filter text, quoting it when it contains reserved characters.
fn filter_value(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    if raw.contains(RESERVED) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// Translate a query into REST query parameters.
pub fn query_pairs(query: &Query) -> StoreResult<Vec<(String, String)>> {
    if let Some(column) = query.invalid_column() {
        return Err(StoreError::InvalidQuery(format!(
            "Invalid column name: {:?}",
            column
        )));
    }

    let mut pairs = vec![("select".to_string(), "*".to_string())];

    for filter in &query.filters {
        match filter {
            Filter::Eq { column, value } if value.is_null() => {
                pairs.push((column.clone(), "is.null".to_string()));
            }
            Filter::Eq { column, value } => {
                pairs.push((column.clone(), format!("eq.{}", filter_value(value))));
            }
            Filter::In { column, values } => {
                let list = values.iter().map(filter_value).collect::<Vec<_>>().join(",");
                pairs.push((column.clone(), format!("in.({})", list)));
            }
            Filter::Search { columns, term } => {
                let pattern = filter_value(&Value::String(format!("*{}*", term)));
                let clauses = columns
                    .iter()
                    .map(|c| format!("{}.ilike.{}", c, pattern))
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.push(("or".to_string(), format!("({})", clauses)));
            }
        }
    }

    if !query.order.is_empty() {
        let keys = query
            .order
            .iter()
            .map(|order| {
                let direction = match order.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                format!("{}.{}", order.column, direction)
            })
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), keys));
    }

    if let Some(range) = &query.range {
        pairs.push(("offset".to_string(), range.offset.to_string()));
        pairs.push(("limit".to_string(), range.limit.to_string()));
    }

    Ok(pairs)
}

/// Total from a `Content-Range` header (`0-24/1200`, `*/0`). `*` totals are unknown.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Condense a backend error body into one human readable line.
pub fn normalize_error_body(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.trim().is_empty()) {
            let mut out = message;
            if let Some(details) = parsed.details.filter(|d| !d.trim().is_empty()) {
                out.push_str(&format!(" ({})", details));
            }
            if let Some(hint) = parsed.hint.filter(|h| !h.trim().is_empty()) {
                out.push_str(&format!(". Hint: {}", hint));
            }
            if let Some(code) = parsed.code.filter(|c| !c.trim().is_empty()) {
                out.push_str(&format!(" [{}]", code));
            }
            return out;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.unwrap_or("Unknown error").to_string();
    }
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    #[tracing::instrument(skip(self, query), fields(db.table = %table, db.operation = "select"))]
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        let pairs = query_pairs(query)?;
        let request = self.client.get(self.table_url(table)).query(&pairs);
        let response = self.send(request).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.without_url().to_string()))?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!(
                "expected an array of {} rows, got {}",
                table,
                json_kind(&other)
            ))),
        }
    }

    #[tracing::instrument(skip(self, query), fields(db.table = %table, db.operation = "count"))]
    async fn count(&self, table: Table, query: &Query) -> StoreResult<u64> {
        let pairs = query_pairs(&query.filters_only())?;
        let request = self
            .client
            .head(self.table_url(table))
            .query(&pairs)
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;

        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Decode("missing Content-Range header".to_string()))?;

        parse_content_range(header).ok_or_else(|| {
            StoreError::Decode(format!("unparseable Content-Range header: {}", header))
        })
    }

    #[tracing::instrument(skip(self, rows), fields(db.table = %table, db.operation = "insert", rows = rows.len()))]
    async fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &OnConflict,
    ) -> StoreResult<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(bad) = on_conflict
            .columns()
            .iter()
            .find(|c| !crate::query::is_valid_column(c))
        {
            return Err(StoreError::InvalidQuery(format!(
                "Invalid conflict column: {:?}",
                bad
            )));
        }

        let mut request = self.client.post(self.table_url(table)).json(&rows);
        request = match on_conflict {
            OnConflict::Error => request.header("Prefer", "return=representation"),
            OnConflict::Ignore(columns) => request
                .query(&[("on_conflict", columns.join(","))])
                .header("Prefer", "resolution=ignore-duplicates,return=representation"),
            OnConflict::Update(columns) => request
                .query(&[("on_conflict", columns.join(","))])
                .header("Prefer", "resolution=merge-duplicates,return=representation"),
        };

        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.without_url().to_string()))
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Rest
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
