//! Repositories for the data access layer
//!
//! One repository per backend table. Repositories return backend row shapes; turning
//! them into dashboard shapes is the job of `crewboard_core::transform`.

pub mod application;
pub mod client;
pub mod document;
pub mod enrollment;
pub mod invitation;
pub mod person;
pub mod task;

pub use application::ApplicationRepository;
pub use client::{ClientRepository, DEMO_CLIENT_CODES};
pub use document::DocumentRepository;
pub use enrollment::EnrollmentRepository;
pub use invitation::InvitationRepository;
pub use person::{PeopleFilter, PersonRepository, PERSON_FILTER_COLUMNS, PERSON_SEARCH_COLUMNS};
pub use task::TaskRepository;

use crewboard_core::AppError;
use crewboard_store::OnConflict;
use uuid::Uuid;

/// How batch inserts treat rows whose natural key is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Keep the stored row; only new keys are inserted
    #[default]
    SkipExisting,
    /// Overwrite the stored row with the new values
    Overwrite,
}

impl WriteMode {
    pub(crate) fn on_conflict(self, natural_key: &[&str]) -> OnConflict {
        match self {
            WriteMode::SkipExisting => OnConflict::ignore(natural_key),
            WriteMode::Overwrite => OnConflict::update(natural_key),
        }
    }
}

/// Parse an opaque tenant identifier into a client id.
///
/// Fails before any I/O when the identifier is blank or malformed.
pub fn parse_tenant_id(tenant_id: &str) -> Result<Uuid, AppError> {
    let trimmed = tenant_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Tenant id is required".to_string()));
    }
    Uuid::parse_str(trimmed)
        .map_err(|_| AppError::InvalidInput(format!("Tenant id is not a valid id: {}", trimmed)))
}

/// Ids as in-list filter values
pub(crate) fn id_values(ids: &[Uuid]) -> Vec<serde_json::Value> {
    ids.iter()
        .map(|id| serde_json::Value::String(id.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tenant_id_is_rejected() {
        assert!(matches!(parse_tenant_id("  "), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_tenant_id("acme"), Err(AppError::InvalidInput(_))));

        let id = Uuid::new_v4();
        assert_eq!(parse_tenant_id(&format!(" {} ", id)).unwrap(), id);
    }
}
