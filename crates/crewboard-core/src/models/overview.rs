use serde::{Deserialize, Serialize};

use super::{
    DocumentStatus, EnrollmentState, Person, ReviewStatus, TaskState, TaskStatus,
};

/// A person together with their enrollment, documents, and tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonOverview {
    #[serde(flatten)]
    pub person: Person,
    pub enrollment: EnrollmentState,
    pub documents: Vec<DocumentStatus>,
    pub tasks: Vec<TaskStatus>,
}

impl PersonOverview {
    pub fn verified_documents(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.status == ReviewStatus::Verified)
            .count()
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskState::Completed)
            .count()
    }
}
