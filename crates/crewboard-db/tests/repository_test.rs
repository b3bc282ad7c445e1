mod helpers;

use crewboard_db::{
    DocumentRepository, EnrollmentRepository, PeopleFilter, PersonRepository, TaskRepository,
};
use crewboard_store::{InMemoryStore, Table};
use helpers::{seed_client, seed_people};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_people_pages_are_tenant_scoped_and_newest_first() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP", "2024-01-01T00:00:00Z");
    let other = seed_client(&store, "OTHER", "2024-01-01T00:00:00Z");
    seed_people(&store, tenant, 30);
    seed_people(&store, other, 5);
    let repo = PersonRepository::new(Arc::new(store));

    let filter = PeopleFilter::default();
    assert_eq!(repo.count(tenant, &filter).await.unwrap(), 30);

    let first = repo.page(tenant, &filter, 0, 25).await.unwrap();
    let second = repo.page(tenant, &filter, 25, 25).await.unwrap();
    assert_eq!(first.len(), 25);
    assert_eq!(second.len(), 5);
    assert!(first.iter().chain(&second).all(|p| p.client_id == tenant));
    assert_eq!(first[0].employee_id.as_deref(), Some("EMP-00029"));
    assert_eq!(second[4].employee_id.as_deref(), Some("EMP-00000"));
}

#[tokio::test]
async fn test_search_and_equality_filters() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP", "2024-01-01T00:00:00Z");
    seed_people(&store, tenant, 20);
    let repo = PersonRepository::new(Arc::new(store));

    let engineering = PeopleFilter::default().with_eq("department", "Engineering");
    assert_eq!(repo.count(tenant, &engineering).await.unwrap(), 10);

    let search = PeopleFilter::search("emp-0001");
    assert_eq!(repo.count(tenant, &search).await.unwrap(), 10);

    let blank = PeopleFilter::search("   ");
    assert_eq!(repo.count(tenant, &blank).await.unwrap(), 20);
}

#[tokio::test]
async fn test_empty_id_list_issues_no_query() {
    let store = Arc::new(InMemoryStore::new());
    let metered = Arc::new(crewboard_store::MeteredStore::new(store));
    let repo = EnrollmentRepository::new(metered.clone());

    assert!(repo.list_for_people(Uuid::new_v4(), &[]).await.unwrap().is_empty());
    assert_eq!(metered.total(), 0);
}

#[tokio::test]
async fn test_enrollments_fetched_with_one_in_list_query() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP", "2024-01-01T00:00:00Z");
    let people = seed_people(&store, tenant, 3);
    store.seed(
        Table::PersonEnrollments,
        vec![
            json!({"id": Uuid::new_v4().to_string(), "client_id": tenant.to_string(), "person_id": people[0].to_string(), "completion_percentage": 40}),
            json!({"id": Uuid::new_v4().to_string(), "client_id": tenant.to_string(), "person_id": people[2].to_string(), "onboarding_completed": true}),
            json!({"id": Uuid::new_v4().to_string(), "client_id": tenant.to_string(), "person_id": Uuid::new_v4().to_string()}),
        ],
    );
    let metered = Arc::new(crewboard_store::MeteredStore::new(Arc::new(store)));
    let repo = EnrollmentRepository::new(metered.clone());

    let rows = repo.list_for_people(tenant, &people).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(metered.total(), 1);
}

#[tokio::test]
async fn test_related_rows_are_scoped_to_the_tenant() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP", "2024-01-01T00:00:00Z");
    let other = seed_client(&store, "OTHER", "2024-01-01T00:00:00Z");
    let people = seed_people(&store, tenant, 2);
    let person = people[0].to_string();
    store.seed(
        Table::PersonEnrollments,
        vec![
            json!({"id": Uuid::new_v4().to_string(), "client_id": other.to_string(), "person_id": person}),
            json!({"id": Uuid::new_v4().to_string(), "person_id": person}),
        ],
    );
    store.seed(
        Table::DocumentStatus,
        vec![
            json!({"id": Uuid::new_v4().to_string(), "client_id": tenant.to_string(), "person_id": person, "document_type": "contract"}),
            json!({"id": Uuid::new_v4().to_string(), "client_id": other.to_string(), "person_id": person, "document_type": "tax_form"}),
        ],
    );
    store.seed(
        Table::TaskStatus,
        vec![json!({"id": Uuid::new_v4().to_string(), "client_id": other.to_string(), "person_id": person, "title": "Set up workstation"})],
    );
    let store: Arc<dyn crewboard_store::RemoteStore> = Arc::new(store);

    let enrollments = EnrollmentRepository::new(store.clone())
        .list_for_people(tenant, &people)
        .await
        .unwrap();
    let documents = DocumentRepository::new(store.clone())
        .list_for_people(tenant, &people)
        .await
        .unwrap();
    let tasks = TaskRepository::new(store)
        .list_for_people(tenant, &people)
        .await
        .unwrap();

    assert!(enrollments.is_empty());
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].client_id, Some(tenant));
    assert!(tasks.is_empty());
}
