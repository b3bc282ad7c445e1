use crewboard_core::{models::ClientRow, models::NewClient, AppError};
use crewboard_store::{decode_rows, encode_rows, Direction, OnConflict, Query, RemoteStore, Table};
use std::sync::Arc;
use uuid::Uuid;

/// Demo tenants tried, in order, when the selected tenant does not resolve
pub const DEMO_CLIENT_CODES: &[&str] = &[
    "ACME_CORP",
    "DEMO_CORP",
    "TECHSTART",
    "GLOBAL_RETAIL",
];

/// Repository for tenants
#[derive(Clone)]
pub struct ClientRepository {
    store: Arc<dyn RemoteStore>,
}

impl ClientRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ClientRow>, AppError> {
        let query = Query::new().eq("id", id.to_string()).range(0, 1);
        let rows = self.store.select(Table::Clients, &query).await?;
        Ok(decode_rows(Table::Clients, rows)?.into_iter().next())
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<ClientRow>, AppError> {
        let query = Query::new().eq("client_code", code).range(0, 1);
        let rows = self.store.select(Table::Clients, &query).await?;
        Ok(decode_rows(Table::Clients, rows)?.into_iter().next())
    }

    /// All tenants, oldest first
    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "select"))]
    pub async fn list(&self) -> Result<Vec<ClientRow>, AppError> {
        let query = Query::new()
            .order("created_at", Direction::Asc)
            .order("client_code", Direction::Asc);
        let rows = self.store.select(Table::Clients, &query).await?;
        Ok(decode_rows(Table::Clients, rows)?)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "insert"))]
    pub async fn create(&self, client: &NewClient) -> Result<ClientRow, AppError> {
        let payload = encode_rows(std::slice::from_ref(client))?;
        let rows = self
            .store
            .insert(Table::Clients, payload, &OnConflict::ignore(&["client_code"]))
            .await?;

        match decode_rows(Table::Clients, rows)?.into_iter().next() {
            Some(row) => Ok(row),
            // Already present: the insert was ignored
            None => self.get_by_code(&client.client_code).await?.ok_or_else(|| {
                AppError::Internal(format!(
                    "Client {} was neither inserted nor found",
                    client.client_code
                ))
            }),
        }
    }

    /// Resolve an opaque tenant selector to a tenant.
    ///
    /// The selector is tried as an id, then as a client code. When it does not resolve,
    /// the demo tenants are tried in [`DEMO_CLIENT_CODES`] order, then the oldest tenant.
    /// Only an empty tenant table is an error.
    #[tracing::instrument(skip(self), fields(db.table = "clients", db.operation = "resolve"))]
    pub async fn resolve(&self, selector: &str) -> Result<ClientRow, AppError> {
        let selector = selector.trim();

        if !selector.is_empty() {
            if let Ok(id) = Uuid::parse_str(selector) {
                if let Some(client) = self.get_by_id(id).await? {
                    return Ok(client);
                }
            }
            if let Some(client) = self.get_by_code(selector).await? {
                return Ok(client);
            }
            tracing::warn!(selector = %selector, "Selected client not found, falling back to demo clients");
        }

        let query = Query::new().is_in("client_code", DEMO_CLIENT_CODES.iter().copied());
        let rows = self.store.select(Table::Clients, &query).await?;
        let demo_clients: Vec<ClientRow> = decode_rows(Table::Clients, rows)?;
        for code in DEMO_CLIENT_CODES {
            if let Some(client) = demo_clients.iter().find(|c| c.client_code == *code) {
                tracing::info!(client_code = %client.client_code, "Using demo client");
                return Ok(client.clone());
            }
        }

        let query = Query::new()
            .order("created_at", Direction::Asc)
            .order("client_code", Direction::Asc)
            .range(0, 1);
        let rows = self.store.select(Table::Clients, &query).await?;
        match decode_rows::<ClientRow>(Table::Clients, rows)?.into_iter().next() {
            Some(client) => {
                tracing::info!(client_code = %client.client_code, "Using first available client");
                Ok(client)
            }
            None => Err(AppError::NotFound("No clients exist".to_string())),
        }
    }
}
