use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// `document_status` table row. Many per person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRow {
    pub id: Uuid,
    pub person_id: Uuid,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    Contract,
    IdVerification,
    TaxForm,
    GdprConsent,
    FinancialDisclosure,
    Other(String),
}

impl DocumentType {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Contract => "contract",
            DocumentType::IdVerification => "id_verification",
            DocumentType::TaxForm => "tax_form",
            DocumentType::GdprConsent => "gdpr_consent",
            DocumentType::FinancialDisclosure => "financial_disclosure",
            DocumentType::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "contract" => DocumentType::Contract,
            "id_verification" => DocumentType::IdVerification,
            "tax_form" => DocumentType::TaxForm,
            "gdpr_consent" => DocumentType::GdprConsent,
            "financial_disclosure" => DocumentType::FinancialDisclosure,
            _ => DocumentType::Other(value),
        }
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.as_str().to_string()
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Verified,
    #[default]
    Pending,
    Uploaded,
    Rejected,
}

impl ReviewStatus {
    /// Unknown or missing values fall back to `Pending`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("verified") | Some("approved") => ReviewStatus::Verified,
            Some("uploaded") | Some("submitted") => ReviewStatus::Uploaded,
            Some("rejected") => ReviewStatus::Rejected,
            _ => ReviewStatus::Pending,
        }
    }
}

/// Document review state for one person
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub id: Uuid,
    pub person_id: Uuid,
    pub name: String,
    pub document_type: DocumentType,
    pub status: ReviewStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: String,
}

/// Insert payload for `document_status`. `(person_id, document_type)` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDocument {
    pub person_id: Uuid,
    pub client_id: Uuid,
    pub document_name: String,
    pub document_type: String,
    pub status: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}
