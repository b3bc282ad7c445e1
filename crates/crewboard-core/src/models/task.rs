use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `task_status` table row. Many per person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRow {
    pub id: Uuid,
    pub person_id: Uuid,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskState {
    /// Unknown or missing values fall back to `NotStarted`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("in_progress") | Some("in-progress") | Some("started") => TaskState::InProgress,
            Some("completed") | Some("done") => TaskState::Completed,
            _ => TaskState::NotStarted,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Unknown or missing values fall back to `Medium`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("low") => TaskPriority::Low,
            Some("high") => TaskPriority::High,
            Some("urgent") | Some("critical") => TaskPriority::Urgent,
            _ => TaskPriority::Medium,
        }
    }
}

/// Onboarding/offboarding task for one person
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub id: Uuid,
    pub person_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: TaskState,
    pub priority: TaskPriority,
    pub assigned_to: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert payload for `task_status`. `(person_id, title)` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub person_id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}
