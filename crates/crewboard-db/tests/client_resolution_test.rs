mod helpers;

use crewboard_core::AppError;
use crewboard_db::ClientRepository;
use crewboard_store::InMemoryStore;
use helpers::seed_client;
use std::sync::Arc;

#[tokio::test]
async fn test_resolves_by_code_and_id() {
    let store = InMemoryStore::new();
    let id = seed_client(&store, "ACME_CORP", "2024-01-01T00:00:00Z");
    seed_client(&store, "OTHER", "2023-01-01T00:00:00Z");
    let repo = ClientRepository::new(Arc::new(store));

    assert_eq!(repo.resolve("ACME_CORP").await.unwrap().id, id);
    assert_eq!(repo.resolve(&id.to_string()).await.unwrap().id, id);
}

#[tokio::test]
async fn test_unknown_selector_falls_back_in_demo_priority_order() {
    let store = InMemoryStore::new();
    seed_client(&store, "TECHSTART", "2023-01-01T00:00:00Z");
    let demo = seed_client(&store, "DEMO_CORP", "2024-06-01T00:00:00Z");
    let repo = ClientRepository::new(Arc::new(store));

    // DEMO_CORP precedes TECHSTART in the priority list even though it is newer
    assert_eq!(repo.resolve("NO_SUCH_CLIENT").await.unwrap().id, demo);
    assert_eq!(repo.resolve("").await.unwrap().id, demo);
}

#[tokio::test]
async fn test_falls_back_to_first_available_client() {
    let store = InMemoryStore::new();
    seed_client(&store, "NEWER", "2024-06-01T00:00:00Z");
    let oldest = seed_client(&store, "OLDER", "2022-01-01T00:00:00Z");
    let repo = ClientRepository::new(Arc::new(store));

    assert_eq!(repo.resolve("missing").await.unwrap().id, oldest);
}

#[tokio::test]
async fn test_no_clients_is_not_found() {
    let repo = ClientRepository::new(Arc::new(InMemoryStore::new()));
    let err = repo.resolve("ACME_CORP").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
