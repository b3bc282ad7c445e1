use super::WriteMode;
use crewboard_core::{
    models::{NewPerson, PersonRow},
    AppError,
};
use crewboard_store::{decode_rows, encode_rows, Direction, Query, RemoteStore, Table};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Columns matched by the free-text search
pub const PERSON_SEARCH_COLUMNS: &[&str] = &[
    "full_name",
    "first_name",
    "last_name",
    "employee_id",
    "email",
];

/// Columns accepted as equality filters; anything else is ignored
pub const PERSON_FILTER_COLUMNS: &[&str] = &[
    "department",
    "position",
    "location",
    "manager",
    "employment_status",
    "associate_status",
    "security_clearance",
    "employment_type",
    "work_location",
];

/// Search term and equality filters applied to a people listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PeopleFilter {
    pub search: String,
    pub equals: BTreeMap<String, String>,
}

impl PeopleFilter {
    pub fn search(term: &str) -> Self {
        Self {
            search: term.to_string(),
            equals: BTreeMap::new(),
        }
    }

    pub fn with_eq(mut self, column: &str, value: &str) -> Self {
        self.equals.insert(column.to_string(), value.to_string());
        self
    }

    /// Canonical form: trimmed search term, unknown or blank filters dropped.
    ///
    /// Two filters that select the same rows normalize to equal values, so the result
    /// can key a cache.
    pub fn normalized(&self) -> Self {
        let equals = self
            .equals
            .iter()
            .filter(|(column, value)| {
                let known = PERSON_FILTER_COLUMNS.contains(&column.as_str());
                if !known {
                    tracing::warn!(column = %column, "Ignoring filter on unsupported column");
                }
                known && !value.trim().is_empty()
            })
            .map(|(column, value)| (column.clone(), value.trim().to_string()))
            .collect();

        Self {
            search: self.search.trim().to_string(),
            equals,
        }
    }

    pub fn is_empty(&self) -> bool {
        let normalized = self.normalized();
        normalized.search.is_empty() && normalized.equals.is_empty()
    }

    fn apply(&self, mut query: Query) -> Query {
        let normalized = self.normalized();
        for (column, value) in &normalized.equals {
            query = query.eq(column, value.as_str());
        }
        query.search(PERSON_SEARCH_COLUMNS, &normalized.search)
    }
}

/// Repository for people
#[derive(Clone)]
pub struct PersonRepository {
    store: Arc<dyn RemoteStore>,
}

impl PersonRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    fn scoped(client_id: Uuid, filter: &PeopleFilter) -> Query {
        filter.apply(Query::new().eq("client_id", client_id.to_string()))
    }

    /// Exact number of people matching `filter` for a tenant
    #[tracing::instrument(skip(self), fields(db.table = "people", db.operation = "count"))]
    pub async fn count(&self, client_id: Uuid, filter: &PeopleFilter) -> Result<u64, AppError> {
        let query = Self::scoped(client_id, filter);
        Ok(self.store.count(Table::People, &query).await?)
    }

    /// One page of people, newest first. Ties on `created_at` are broken by id so
    /// consecutive pages never overlap.
    #[tracing::instrument(skip(self), fields(db.table = "people", db.operation = "select"))]
    pub async fn page(
        &self,
        client_id: Uuid,
        filter: &PeopleFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PersonRow>, AppError> {
        let query = Self::scoped(client_id, filter)
            .order("created_at", Direction::Desc)
            .order("id", Direction::Desc)
            .range(offset, limit);
        let rows = self.store.select(Table::People, &query).await?;
        Ok(decode_rows(Table::People, rows)?)
    }

    /// Insert a batch of people keyed by `(client_id, employee_id)`.
    ///
    /// With [`WriteMode::SkipExisting`] returns only the rows inserted by this call; with
    /// [`WriteMode::Overwrite`] returns every row written.
    #[tracing::instrument(skip(self, people), fields(db.table = "people", db.operation = "insert", count = people.len()))]
    pub async fn insert_batch(
        &self,
        people: &[NewPerson],
        mode: WriteMode,
    ) -> Result<Vec<PersonRow>, AppError> {
        if people.is_empty() {
            return Ok(Vec::new());
        }
        let payload = encode_rows(people)?;
        let rows = self
            .store
            .insert(
                Table::People,
                payload,
                &mode.on_conflict(&["client_id", "employee_id"]),
            )
            .await?;
        Ok(decode_rows(Table::People, rows)?)
    }

    /// People of a tenant by natural key
    #[tracing::instrument(skip(self, employee_ids), fields(db.table = "people", db.operation = "select", count = employee_ids.len()))]
    pub async fn find_by_employee_ids(
        &self,
        client_id: Uuid,
        employee_ids: &[String],
    ) -> Result<Vec<PersonRow>, AppError> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .is_in("employee_id", employee_ids.iter().map(String::as_str));
        let rows = self.store.select(Table::People, &query).await?;
        Ok(decode_rows(Table::People, rows)?)
    }
}
