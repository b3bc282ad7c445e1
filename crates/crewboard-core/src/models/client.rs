use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `clients` table row. The client is the tenant: every other row is scoped by `client_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRow {
    pub id: Uuid,
    pub client_code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Tenant as shown in the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub domain: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for `clients`
#[derive(Debug, Clone, Serialize)]
pub struct NewClient {
    pub client_code: String,
    pub name: String,
    pub domain: String,
    pub status: String,
}
