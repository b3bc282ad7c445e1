//! Row-to-view transforms
//!
//! Pure functions, one per entity kind, mapping backend rows onto the shapes the
//! dashboard consumes. Missing optional columns become empty strings, empty collections,
//! or `None`; unknown enum values map to a documented fallback. Nothing here fails.

use std::collections::BTreeSet;

use crate::models::{
    Application, ApplicationKind, ApplicationRow, Client, ClientRow, DocumentRow, DocumentStatus,
    DocumentType, Enrollment, EnrollmentRow, Invitation, InvitationRow, InvitationStatus, Person,
    PersonRow, PersonStatus, ResolvedStatus, ReviewStatus, StatusSource, TaskPriority, TaskRow,
    TaskState, TaskStatus,
};

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn string_set(values: Option<Vec<String>>) -> BTreeSet<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Map an associate status (second schema generation) onto the canonical status.
fn associate_to_status(value: &str) -> Option<PersonStatus> {
    match value.trim().to_lowercase().as_str() {
        "pre_onboarding" | "pre-onboarding" | "onboarding" | "pending" => {
            Some(PersonStatus::Future)
        }
        "active" | "offboarding" => Some(PersonStatus::Active),
        "offboarded" | "alumni" | "inactive" => Some(PersonStatus::Former),
        _ => None,
    }
}

/// Map a first-generation `status` value onto the canonical status.
fn legacy_to_status(value: &str) -> Option<PersonStatus> {
    match value.trim().to_lowercase().as_str() {
        "active" | "offboarding" | "on_leave" => Some(PersonStatus::Active),
        "future" | "onboarding" | "pending" | "pre_hire" | "new_hire" => {
            Some(PersonStatus::Future)
        }
        "former" | "inactive" | "terminated" | "alumni" | "offboarded" | "resigned" => {
            Some(PersonStatus::Former)
        }
        _ => None,
    }
}

/// Reconcile the status columns of both schema generations into one canonical status.
///
/// Priority order:
/// 1. `employment_status` when it is exactly one of `active`, `former`, `future`
/// 2. `associate_status`, mapped through the associate vocabulary
/// 3. the legacy `status` column, mapped through the legacy vocabulary
/// 4. otherwise [`PersonStatus::Other`] with [`StatusSource::Unknown`]
pub fn resolve_person_status(
    employment_status: Option<&str>,
    associate_status: Option<&str>,
    legacy_status: Option<&str>,
) -> ResolvedStatus {
    if let Some(status) = employment_status.and_then(PersonStatus::parse_exact) {
        return ResolvedStatus {
            status,
            source: StatusSource::EmploymentStatus,
        };
    }
    if let Some(status) = associate_status.and_then(associate_to_status) {
        return ResolvedStatus {
            status,
            source: StatusSource::AssociateStatus,
        };
    }
    if let Some(status) = legacy_status.and_then(legacy_to_status) {
        return ResolvedStatus {
            status,
            source: StatusSource::LegacyStatus,
        };
    }
    ResolvedStatus {
        status: PersonStatus::Other,
        source: StatusSource::Unknown,
    }
}

pub fn transform_client(row: ClientRow) -> Client {
    let name = text(row.name);
    Client {
        id: row.id,
        name: if name.is_empty() {
            row.client_code.clone()
        } else {
            name
        },
        code: row.client_code,
        domain: text(row.domain),
        is_active: row
            .status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(true),
        created_at: row.created_at,
    }
}

pub fn transform_application(row: ApplicationRow) -> Application {
    let mut features: Vec<String> = match row.features {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter(|(_, enabled)| enabled.as_bool().unwrap_or(false))
            .map(|(name, _)| name)
            .collect(),
        _ => Vec::new(),
    };
    features.sort();
    features.dedup();

    let config = match row.config {
        Some(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::Value::Object(serde_json::Map::new()),
    };

    Application {
        id: row.id,
        client_id: row.client_id,
        name: text(row.app_name),
        kind: row
            .app_type
            .as_deref()
            .map(ApplicationKind::from)
            .unwrap_or(ApplicationKind::Other),
        is_active: row
            .status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(true),
        features,
        config,
        created_at: row.created_at,
    }
}

pub fn transform_person(row: PersonRow) -> Person {
    let resolved = resolve_person_status(
        row.employment_status.as_deref(),
        row.associate_status.as_deref(),
        row.status.as_deref(),
    );

    let first_name = text(row.first_name);
    let last_name = text(row.last_name);
    let full_name = match text(row.full_name) {
        name if !name.is_empty() => name,
        _ => format!("{} {}", first_name, last_name).trim().to_string(),
    };

    Person {
        id: row.id,
        client_id: row.client_id,
        person_code: text(row.employee_id),
        first_name,
        last_name,
        full_name,
        email: text(row.email),
        department: text(row.department),
        position: text(row.position),
        location: text(row.location),
        manager: text(row.manager),
        status: resolved.status,
        status_source: resolved.source,
        associate_status: text(row.associate_status),
        security_clearance: text(row.security_clearance),
        employment_type: text(row.employment_type),
        work_location: text(row.work_location),
        skills: string_set(row.skills),
        languages: string_set(row.languages),
        start_date: row.start_date,
        created_at: row.created_at,
    }
}

/// Inverse of [`transform_person`], used when writing edits back.
///
/// The canonical status is written to `employment_status`, so the row is always in the
/// current schema generation.
pub fn person_to_row(person: &Person) -> PersonRow {
    PersonRow {
        id: person.id,
        client_id: person.client_id,
        employee_id: non_empty(&person.person_code),
        first_name: non_empty(&person.first_name),
        last_name: non_empty(&person.last_name),
        full_name: non_empty(&person.full_name),
        email: non_empty(&person.email),
        department: non_empty(&person.department),
        position: non_empty(&person.position),
        location: non_empty(&person.location),
        manager: non_empty(&person.manager),
        status: None,
        employment_status: match person.status {
            PersonStatus::Other => None,
            status => Some(status.as_str().to_string()),
        },
        associate_status: non_empty(&person.associate_status),
        security_clearance: non_empty(&person.security_clearance),
        employment_type: non_empty(&person.employment_type),
        work_location: non_empty(&person.work_location),
        skills: Some(person.skills.iter().cloned().collect()),
        languages: Some(person.languages.iter().cloned().collect()),
        start_date: person.start_date,
        created_at: person.created_at,
        updated_at: None,
    }
}

/// `onboarding_completed` is authoritative; see [`Enrollment::is_consistent`].
pub fn transform_enrollment(row: EnrollmentRow) -> Enrollment {
    let completed = row.onboarding_completed.unwrap_or(false);
    let percentage = if completed {
        100
    } else {
        row.completion_percentage
            .filter(|pct| pct.is_finite())
            .map(|pct| pct.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0)
    };

    let enrollment = Enrollment {
        id: row.id,
        person_id: row.person_id,
        application_id: row.application_id,
        onboarding_completed: completed,
        completion_percentage: percentage,
        stored_percentage: row.completion_percentage,
        last_activity: row.last_activity,
        enrolled_at: row.created_at,
    };

    if !enrollment.is_consistent() {
        tracing::debug!(
            enrollment_id = %enrollment.id,
            person_id = %enrollment.person_id,
            stored_percentage = ?enrollment.stored_percentage,
            onboarding_completed = completed,
            "Enrollment completion flag and percentage disagree"
        );
    }

    enrollment
}

pub fn transform_document(row: DocumentRow) -> DocumentStatus {
    let document_type = row
        .document_type
        .map(DocumentType::from)
        .unwrap_or_else(|| DocumentType::Other(String::new()));
    let name = match text(row.document_name) {
        name if !name.is_empty() => name,
        _ => document_type.as_str().replace('_', " "),
    };

    DocumentStatus {
        id: row.id,
        person_id: row.person_id,
        name,
        status: ReviewStatus::parse_lenient(row.status.as_deref()),
        document_type,
        uploaded_at: row.uploaded_at,
        reviewed_at: row.reviewed_at,
        reviewed_by: text(row.reviewed_by),
    }
}

pub fn transform_task(row: TaskRow) -> TaskStatus {
    TaskStatus {
        id: row.id,
        person_id: row.person_id,
        title: text(row.title),
        description: text(row.description),
        category: text(row.category),
        status: TaskState::parse_lenient(row.status.as_deref()),
        priority: TaskPriority::parse_lenient(row.priority.as_deref()),
        assigned_to: text(row.assigned_to),
        assigned_at: row.assigned_at,
        due_date: row.due_date,
        completed_at: row.completed_at,
    }
}

pub fn transform_invitation(row: InvitationRow) -> Invitation {
    Invitation {
        id: row.id,
        client_id: row.client_id,
        application_id: row.application_id,
        email: text(row.email),
        first_name: text(row.first_name),
        last_name: text(row.last_name),
        person_code: text(row.employee_id),
        department: text(row.department),
        position: text(row.position),
        permissions: row.permissions.unwrap_or_default(),
        status: InvitationStatus::parse_lenient(row.status.as_deref()),
        expires_at: row.expires_at,
        accepted_at: row.accepted_at,
        created_at: row.created_at,
    }
}
