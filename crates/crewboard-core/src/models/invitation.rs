use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// `invitations` table row.
///
/// Invitees may not exist as people yet, so identifying fields are denormalized onto
/// the invitation itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvitationRow {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub application_id: Option<Uuid>,
    #[serde(default)]
    pub token_hash: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    /// Unknown or missing values fall back to `Pending`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("accepted") => InvitationStatus::Accepted,
            Some("expired") => InvitationStatus::Expired,
            Some("revoked") | Some("cancelled") => InvitationStatus::Revoked,
            _ => InvitationStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl Display for InvitationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Expired => write!(f, "expired"),
            InvitationStatus::Revoked => write!(f, "revoked"),
        }
    }
}

/// Invitation as shown in the dashboard. The token hash never leaves the transform layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub client_id: Uuid,
    pub application_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub person_code: String,
    pub department: String,
    pub position: String,
    pub permissions: Vec<String>,
    pub status: InvitationStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Status as of `now`: a pending invitation past its expiry reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match (self.status, self.expires_at) {
            (InvitationStatus::Pending, Some(expires_at)) if expires_at <= now => {
                InvitationStatus::Expired
            }
            (status, _) => status,
        }
    }
}
