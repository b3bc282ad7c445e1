use super::{id_values, WriteMode};
use crewboard_core::{
    models::{NewTask, TaskRow},
    AppError,
};
use crewboard_store::{decode_rows, encode_rows, Direction, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for onboarding and offboarding tasks
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn RemoteStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Tasks of many people in a single query, ordered by due date
    #[tracing::instrument(skip(self, person_ids), fields(db.table = "task_status", db.operation = "select", count = person_ids.len()))]
    pub async fn list_for_people(
        &self,
        client_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<TaskRow>, AppError> {
        if person_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .is_in("person_id", id_values(person_ids))
            .order("due_date", Direction::Asc)
            .order("id", Direction::Asc);
        let rows = self.store.select(Table::TaskStatus, &query).await?;
        Ok(decode_rows(Table::TaskStatus, rows)?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "task_status", db.operation = "count"))]
    pub async fn count_for_client(&self, client_id: Uuid) -> Result<u64, AppError> {
        let query = Query::new().eq("client_id", client_id.to_string());
        Ok(self.store.count(Table::TaskStatus, &query).await?)
    }

    /// Insert tasks keyed by `(person_id, title)`
    #[tracing::instrument(skip(self, tasks), fields(db.table = "task_status", db.operation = "insert", count = tasks.len()))]
    pub async fn insert_batch(
        &self,
        tasks: &[NewTask],
        mode: WriteMode,
    ) -> Result<Vec<TaskRow>, AppError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let payload = encode_rows(tasks)?;
        let rows = self
            .store
            .insert(
                Table::TaskStatus,
                payload,
                &mode.on_conflict(&["person_id", "title"]),
            )
            .await?;
        Ok(decode_rows(Table::TaskStatus, rows)?)
    }
}
