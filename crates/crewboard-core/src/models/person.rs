use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// `people` table row.
///
/// Two schema generations coexist in the backend: older rows carry a single `status`
/// string, newer rows carry `employment_status` and (optionally) `associate_status`.
/// Both shapes deserialize into this struct and are reconciled by
/// [`crate::transform::resolve_person_status`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonRow {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Manager referenced by display name, not by id
    #[serde(default)]
    pub manager: Option<String>,
    /// First-generation status column
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub employment_status: Option<String>,
    #[serde(default)]
    pub associate_status: Option<String>,
    #[serde(default)]
    pub security_clearance: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub work_location: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Canonical employment status used everywhere downstream of the transform layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PersonStatus {
    Active,
    Former,
    Future,
    /// Neither schema generation produced a recognizable value
    Other,
}

impl PersonStatus {
    /// Exact match against the canonical vocabulary (case-insensitive, trimmed).
    pub fn parse_exact(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "active" => Some(PersonStatus::Active),
            "former" => Some(PersonStatus::Former),
            "future" => Some(PersonStatus::Future),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonStatus::Active => "active",
            PersonStatus::Former => "former",
            PersonStatus::Future => "future",
            PersonStatus::Other => "other",
        }
    }
}

impl Display for PersonStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Which column the canonical status was derived from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusSource {
    EmploymentStatus,
    AssociateStatus,
    LegacyStatus,
    Unknown,
}

/// Result of reconciling the status columns of one row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub status: PersonStatus,
    pub source: StatusSource,
}

/// Person as shown in the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Uuid,
    pub client_id: Uuid,
    pub person_code: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub location: String,
    pub manager: String,
    pub status: PersonStatus,
    pub status_source: StatusSource,
    /// Raw associate status, kept for display; empty when absent
    pub associate_status: String,
    pub security_clearance: String,
    pub employment_type: String,
    pub work_location: String,
    pub skills: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    pub start_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for `people`. `(client_id, employee_id)` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPerson {
    pub client_id: Uuid,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub location: String,
    pub manager: Option<String>,
    pub employment_status: String,
    pub associate_status: Option<String>,
    pub security_clearance: String,
    pub employment_type: String,
    pub work_location: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub start_date: NaiveDate,
}
