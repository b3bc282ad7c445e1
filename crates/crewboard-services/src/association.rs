//! Bulk association loading
//!
//! Given one page of people, fetches every related collection with a single in-list
//! query keyed by the page's person ids, indexes each result set by `person_id` in one
//! pass, and attaches the matches to each person. The number of queries depends on the
//! number of related collections, never on the number of people.
//!
//! Data-quality anomalies are tolerated and counted in a [`LoadReport`]:
//!
//! - a second enrollment row for a person is ignored; the first row in result order wins
//! - rows owned by another tenant are dropped
//! - rows for a person outside the page are dropped

use crate::progress::{Progress, ProgressSink, Stage};
use crewboard_core::{
    models::{DocumentRow, EnrollmentRow, EnrollmentState, Person, PersonOverview, TaskRow},
    transform::{transform_document, transform_enrollment, transform_task},
    AppError,
};
use crewboard_db::{DocumentRepository, EnrollmentRepository, TaskRepository};
use crewboard_store::RemoteStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use uuid::Uuid;

/// Related collections fetched per page: enrollments, documents, tasks
pub const RELATED_COLLECTIONS: usize = 3;

/// Raw related rows for one page
#[derive(Debug, Clone, Default)]
pub struct RelatedRows {
    pub enrollments: Vec<EnrollmentRow>,
    pub documents: Vec<DocumentRow>,
    pub tasks: Vec<TaskRow>,
}

/// What composing a page found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub people: usize,
    pub enrolled: usize,
    pub duplicate_enrollments: usize,
    /// Enrollments whose completion flag and stored percentage disagree
    pub inconsistent_enrollments: usize,
    pub foreign_tenant_rows: usize,
    pub orphan_rows: usize,
}

impl LoadReport {
    pub fn anomalies(&self) -> usize {
        self.duplicate_enrollments
            + self.inconsistent_enrollments
            + self.foreign_tenant_rows
            + self.orphan_rows
    }
}

/// Index rows by key keeping the first row per key. Returns the index and the number of
/// rows that lost to an earlier row with the same key.
pub fn index_one<T, K, F>(rows: impl IntoIterator<Item = T>, key: F) -> (HashMap<K, T>, usize)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::new();
    let mut duplicates = 0;
    for row in rows {
        let k = key(&row);
        if index.contains_key(&k) {
            duplicates += 1;
            continue;
        }
        index.insert(k, row);
    }
    (index, duplicates)
}

/// Group rows by key, preserving result order within each group
pub fn index_many<T, K, F>(rows: impl IntoIterator<Item = T>, key: F) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, Vec<T>> = HashMap::new();
    for row in rows {
        index.entry(key(&row)).or_default().push(row);
    }
    index
}

/// Tenant and page membership check applied to every related row
struct Scope<'a> {
    client_id: Uuid,
    page: &'a HashSet<Uuid>,
}

impl Scope<'_> {
    fn admit(&self, table: &str, person_id: Uuid, row_client: Option<Uuid>, report: &mut LoadReport) -> bool {
        if let Some(owner) = row_client {
            if owner != self.client_id {
                tracing::warn!(
                    table,
                    person_id = %person_id,
                    owner = %owner,
                    "Dropping related row owned by another tenant"
                );
                report.foreign_tenant_rows += 1;
                return false;
            }
        }
        if !self.page.contains(&person_id) {
            tracing::warn!(table, person_id = %person_id, "Dropping related row for a person outside the page");
            report.orphan_rows += 1;
            return false;
        }
        true
    }
}

/// Attach related rows to people. Pure: no I/O, single pass per collection.
pub fn compose(
    client_id: Uuid,
    people: Vec<Person>,
    related: RelatedRows,
) -> (Vec<PersonOverview>, LoadReport) {
    let mut report = LoadReport::default();

    let people: Vec<Person> = people
        .into_iter()
        .filter(|person| {
            if person.client_id != client_id {
                tracing::warn!(person_id = %person.id, "Dropping person owned by another tenant");
                report.foreign_tenant_rows += 1;
                false
            } else {
                true
            }
        })
        .collect();
    let page: HashSet<Uuid> = people.iter().map(|p| p.id).collect();
    let scope = Scope {
        client_id,
        page: &page,
    };

    let enrollments: Vec<EnrollmentRow> = related
        .enrollments
        .into_iter()
        .filter(|row| scope.admit("person_enrollments", row.person_id, row.client_id, &mut report))
        .collect();
    let (mut enrollments, duplicates) = index_one(enrollments, |row| row.person_id);
    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            "Ignoring duplicate enrollment rows; the first row per person is used"
        );
    }
    report.duplicate_enrollments = duplicates;

    let documents = related
        .documents
        .into_iter()
        .filter(|row| scope.admit("document_status", row.person_id, row.client_id, &mut report));
    let mut documents = index_many(documents, |row| row.person_id);

    let tasks = related
        .tasks
        .into_iter()
        .filter(|row| scope.admit("task_status", row.person_id, row.client_id, &mut report));
    let mut tasks = index_many(tasks, |row| row.person_id);

    let composed: Vec<PersonOverview> = people
        .into_iter()
        .map(|person| {
            let enrollment = enrollments.remove(&person.id).map(transform_enrollment);
            if let Some(enrollment) = &enrollment {
                report.enrolled += 1;
                if !enrollment.is_consistent() {
                    report.inconsistent_enrollments += 1;
                }
            }
            let documents = documents
                .remove(&person.id)
                .unwrap_or_default()
                .into_iter()
                .map(transform_document)
                .collect();
            let tasks = tasks
                .remove(&person.id)
                .unwrap_or_default()
                .into_iter()
                .map(transform_task)
                .collect();

            PersonOverview {
                person,
                enrollment: EnrollmentState::from(enrollment),
                documents,
                tasks,
            }
        })
        .collect();

    report.people = composed.len();
    (composed, report)
}

/// Loads and attaches the related collections of a page of people
#[derive(Clone)]
pub struct AssociationLoader {
    enrollments: EnrollmentRepository,
    documents: DocumentRepository,
    tasks: TaskRepository,
}

impl AssociationLoader {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            enrollments: EnrollmentRepository::new(store.clone()),
            documents: DocumentRepository::new(store.clone()),
            tasks: TaskRepository::new(store),
        }
    }

    pub async fn fetch_enrollments(
        &self,
        client_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<Vec<EnrollmentRow>, AppError> {
        self.enrollments.list_for_people(client_id, person_ids).await
    }

    pub async fn fetch_documents_and_tasks(
        &self,
        client_id: Uuid,
        person_ids: &[Uuid],
    ) -> Result<(Vec<DocumentRow>, Vec<TaskRow>), AppError> {
        tokio::try_join!(
            self.documents.list_for_people(client_id, person_ids),
            self.tasks.list_for_people(client_id, person_ids)
        )
    }

    /// Fetch and attach enrollments, documents, and tasks for `people`.
    ///
    /// Issues [`RELATED_COLLECTIONS`] queries for a non-empty page and none for an empty
    /// one. Reports the `Enrollments` and `DocumentsAndTasks` stages to `progress`.
    #[tracing::instrument(skip(self, people, progress), fields(people = people.len()))]
    pub async fn load(
        &self,
        client_id: Uuid,
        people: Vec<Person>,
        progress: &dyn ProgressSink,
    ) -> Result<(Vec<PersonOverview>, LoadReport), AppError> {
        let person_ids: Vec<Uuid> = people.iter().map(|p| p.id).collect();

        progress.report(Progress::at(
            Stage::Enrollments,
            format!("Loading enrollments for {} people", person_ids.len()),
        ));
        let enrollments = self.fetch_enrollments(client_id, &person_ids).await?;

        progress.report(Progress::at(
            Stage::DocumentsAndTasks,
            format!("Loading documents and tasks for {} people", person_ids.len()),
        ));
        let (documents, tasks) = self.fetch_documents_and_tasks(client_id, &person_ids).await?;

        let (composed, report) = compose(
            client_id,
            people,
            RelatedRows {
                enrollments,
                documents,
                tasks,
            },
        );

        if report.anomalies() > 0 {
            tracing::debug!(?report, "Composed page with tolerated data anomalies");
        }
        Ok((composed, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewboard_core::models::PersonRow;
    use crewboard_core::transform::transform_person;

    fn person(client_id: Uuid) -> Person {
        transform_person(PersonRow {
            id: Uuid::new_v4(),
            client_id,
            employment_status: Some("active".to_string()),
            ..PersonRow::default()
        })
    }

    fn enrollment(person_id: Uuid, client_id: Option<Uuid>, pct: f64) -> EnrollmentRow {
        EnrollmentRow {
            id: Uuid::new_v4(),
            person_id,
            client_id,
            application_id: None,
            onboarding_completed: Some(pct >= 100.0),
            completion_percentage: Some(pct),
            last_activity: None,
            created_at: None,
        }
    }

    #[test]
    fn index_one_keeps_first_row() {
        let (index, duplicates) = index_one(vec![(1, "a"), (2, "b"), (1, "c")], |r| r.0);
        assert_eq!(duplicates, 1);
        assert_eq!(index[&1].1, "a");
    }

    #[test]
    fn index_many_preserves_order() {
        let index = index_many(vec![(1, "a"), (2, "b"), (1, "c")], |r| r.0);
        assert_eq!(index[&1], vec![(1, "a"), (1, "c")]);
    }

    #[test]
    fn missing_enrollment_is_explicit() {
        let client_id = Uuid::new_v4();
        let people = vec![person(client_id), person(client_id)];
        let related = RelatedRows {
            enrollments: vec![enrollment(people[0].id, Some(client_id), 40.0)],
            ..RelatedRows::default()
        };

        let (composed, report) = compose(client_id, people, related);
        assert!(composed[0].enrollment.is_enrolled());
        assert_eq!(composed[1].enrollment, EnrollmentState::NotEnrolled);
        assert_eq!(report.enrolled, 1);
        assert_eq!(report.anomalies(), 0);
    }

    #[test]
    fn duplicate_enrollment_resolves_to_first_in_result_order() {
        let client_id = Uuid::new_v4();
        let people = vec![person(client_id)];
        let first = enrollment(people[0].id, None, 30.0);
        let second = enrollment(people[0].id, None, 90.0);
        let first_id = first.id;

        let (composed, report) = compose(
            client_id,
            people,
            RelatedRows {
                enrollments: vec![first, second],
                ..RelatedRows::default()
            },
        );
        assert_eq!(composed[0].enrollment.as_enrollment().unwrap().id, first_id);
        assert_eq!(report.duplicate_enrollments, 1);
    }

    #[test]
    fn foreign_and_orphan_rows_are_dropped() {
        let client_id = Uuid::new_v4();
        let people = vec![person(client_id), person(Uuid::new_v4())];
        let in_page = people[0].id;
        let related = RelatedRows {
            enrollments: vec![
                enrollment(in_page, Some(Uuid::new_v4()), 10.0),
                enrollment(Uuid::new_v4(), Some(client_id), 10.0),
            ],
            ..RelatedRows::default()
        };

        let (composed, report) = compose(client_id, people, related);
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].enrollment, EnrollmentState::NotEnrolled);
        assert_eq!(report.foreign_tenant_rows, 2);
        assert_eq!(report.orphan_rows, 1);
    }
}
