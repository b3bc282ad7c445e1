use super::{id_values, WriteMode};
use crewboard_core::{
    models::{EnrollmentRow, NewEnrollment},
    AppError,
};
use crewboard_store::{decode_rows, encode_rows, Direction, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for person enrollments
#[derive(Clone)]
pub struct EnrollmentRepository {
    store: Arc<dyn RemoteStore>,
}

impl EnrollmentRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Enrollments of a tenant's people in a single query.
    ///
    /// Rows come back oldest first, so when a person has more than one enrollment the
    /// earliest one is first in result order. An empty id list issues no query.
    #[tracing::instrument(skip(self, person_ids), fields(db.table = "person_enrollments", db.operation = "select", count = person_ids.len()))]
    pub async fn list_for_people(
        &self,
        client_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<EnrollmentRow>, AppError> {
        if person_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .is_in("person_id", id_values(person_ids))
            .order("created_at", Direction::Asc)
            .order("id", Direction::Asc);
        let rows = self.store.select(Table::PersonEnrollments, &query).await?;
        Ok(decode_rows(Table::PersonEnrollments, rows)?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "person_enrollments", db.operation = "count"))]
    pub async fn count_for_client(&self, client_id: Uuid) -> Result<u64, AppError> {
        let query = Query::new().eq("client_id", client_id.to_string());
        Ok(self.store.count(Table::PersonEnrollments, &query).await?)
    }

    /// Insert enrollments, one per person
    #[tracing::instrument(skip(self, enrollments), fields(db.table = "person_enrollments", db.operation = "insert", count = enrollments.len()))]
    pub async fn insert_batch(
        &self,
        enrollments: &[NewEnrollment],
        mode: WriteMode,
    ) -> Result<Vec<EnrollmentRow>, AppError> {
        if enrollments.is_empty() {
            return Ok(Vec::new());
        }
        let payload = encode_rows(enrollments)?;
        let rows = self
            .store
            .insert(
                Table::PersonEnrollments,
                payload,
                &mode.on_conflict(&["person_id"]),
            )
            .await?;
        Ok(decode_rows(Table::PersonEnrollments, rows)?)
    }
}
