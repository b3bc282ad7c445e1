use crewboard_core::{models::ApplicationRow, AppError};
use crewboard_store::{decode_rows, Direction, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for tenant applications (read-mostly)
#[derive(Clone)]
pub struct ApplicationRepository {
    store: Arc<dyn RemoteStore>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "select"))]
    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .order("created_at", Direction::Asc)
            .order("id", Direction::Asc);
        let rows = self.store.select(Table::Applications, &query).await?;
        Ok(decode_rows(Table::Applications, rows)?)
    }
}
