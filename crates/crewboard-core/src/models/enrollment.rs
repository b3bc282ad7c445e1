use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `person_enrollments` table row. One per person in well-formed data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub person_id: Uuid,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub application_id: Option<Uuid>,
    #[serde(default)]
    pub onboarding_completed: Option<bool>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub person_id: Uuid,
    pub application_id: Option<Uuid>,
    /// Authoritative completion flag
    pub onboarding_completed: bool,
    /// 0..=100; forced to 100 when `onboarding_completed` is set
    pub completion_percentage: u8,
    /// Percentage as stored, before reconciliation with the flag
    pub stored_percentage: Option<f64>,
    pub last_activity: Option<DateTime<Utc>>,
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// True when the stored flag and stored percentage agree (100% iff completed).
    /// Disagreeing records are tolerated and only reported.
    pub fn is_consistent(&self) -> bool {
        match self.stored_percentage {
            Some(pct) => (pct >= 100.0) == self.onboarding_completed,
            None => true,
        }
    }
}

/// Enrollment attached to a person: either present or explicitly absent.
///
/// A person without an enrollment row is a valid state and is distinct from an
/// enrollment at 0% completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "state", content = "enrollment", rename_all = "snake_case")]
pub enum EnrollmentState {
    Enrolled(Enrollment),
    #[default]
    NotEnrolled,
}

impl EnrollmentState {
    pub fn as_enrollment(&self) -> Option<&Enrollment> {
        match self {
            EnrollmentState::Enrolled(enrollment) => Some(enrollment),
            EnrollmentState::NotEnrolled => None,
        }
    }

    pub fn is_enrolled(&self) -> bool {
        matches!(self, EnrollmentState::Enrolled(_))
    }
}

impl From<Option<Enrollment>> for EnrollmentState {
    fn from(value: Option<Enrollment>) -> Self {
        match value {
            Some(enrollment) => EnrollmentState::Enrolled(enrollment),
            None => EnrollmentState::NotEnrolled,
        }
    }
}

/// Insert payload for `person_enrollments`. `person_id` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEnrollment {
    pub person_id: Uuid,
    pub client_id: Uuid,
    pub application_id: Option<Uuid>,
    pub onboarding_completed: bool,
    pub completion_percentage: f64,
    pub last_activity: DateTime<Utc>,
}
