use super::{id_values, WriteMode};
use crewboard_core::{
    models::{DocumentRow, NewDocument},
    AppError,
};
use crewboard_store::{decode_rows, encode_rows, Direction, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for per-person document review state
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn RemoteStore>,
}

impl DocumentRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Documents of a tenant's people in a single query; an empty id list issues no query
    #[tracing::instrument(skip(self, person_ids), fields(db.table = "document_status", db.operation = "select", count = person_ids.len()))]
    pub async fn list_for_people(
        &self,
        client_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<DocumentRow>, AppError> {
        if person_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .is_in("person_id", id_values(person_ids))
            .order("created_at", Direction::Asc)
            .order("id", Direction::Asc);
        let rows = self.store.select(Table::DocumentStatus, &query).await?;
        Ok(decode_rows(Table::DocumentStatus, rows)?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_status", db.operation = "count"))]
    pub async fn count_for_client(&self, client_id: Uuid) -> Result<u64, AppError> {
        let query = Query::new().eq("client_id", client_id.to_string());
        Ok(self.store.count(Table::DocumentStatus, &query).await?)
    }

    /// Insert documents keyed by `(person_id, document_type)`
    #[tracing::instrument(skip(self, documents), fields(db.table = "document_status", db.operation = "insert", count = documents.len()))]
    pub async fn insert_batch(
        &self,
        documents: &[NewDocument],
        mode: WriteMode,
    ) -> Result<Vec<DocumentRow>, AppError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let payload = encode_rows(documents)?;
        let rows = self
            .store
            .insert(
                Table::DocumentStatus,
                payload,
                &mode.on_conflict(&["person_id", "document_type"]),
            )
            .await?;
        Ok(decode_rows(Table::DocumentStatus, rows)?)
    }
}
