use crewboard_core::{models::InvitationRow, AppError};
use crewboard_store::{decode_rows, Direction, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for invitations
#[derive(Clone)]
pub struct InvitationRepository {
    store: Arc<dyn RemoteStore>,
}

impl InvitationRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Invitations of a tenant, newest first
    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<InvitationRow>, AppError> {
        let query = Query::new()
            .eq("client_id", client_id.to_string())
            .order("created_at", Direction::Desc)
            .order("id", Direction::Desc);
        let rows = self.store.select(Table::Invitations, &query).await?;
        Ok(decode_rows(Table::Invitations, rows)?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "count"))]
    pub async fn count_for_client(&self, client_id: Uuid) -> Result<u64, AppError> {
        let query = Query::new().eq("client_id", client_id.to_string());
        Ok(self.store.count(Table::Invitations, &query).await?)
    }
}
