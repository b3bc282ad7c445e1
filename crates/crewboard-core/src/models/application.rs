use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// `applications` table row: a tenant-scoped onboarding or offboarding "app".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Either a list of feature names or an object of `feature -> enabled`
    #[serde(default)]
    pub features: Option<serde_json::Value>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    Onboarding,
    Offboarding,
    Other,
}

impl Display for ApplicationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ApplicationKind::Onboarding => write!(f, "onboarding"),
            ApplicationKind::Offboarding => write!(f, "offboarding"),
            ApplicationKind::Other => write!(f, "other"),
        }
    }
}

impl From<&str> for ApplicationKind {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "onboarding" => ApplicationKind::Onboarding,
            "offboarding" => ApplicationKind::Offboarding,
            _ => ApplicationKind::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub kind: ApplicationKind,
    pub is_active: bool,
    /// Enabled feature names, sorted
    pub features: Vec<String>,
    /// Always a JSON object; missing config becomes `{}`
    pub config: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}
