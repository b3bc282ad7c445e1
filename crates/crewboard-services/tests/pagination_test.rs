mod helpers;

use crewboard_core::models::EnrollmentState;
use crewboard_core::AppError;
use crewboard_db::PeopleFilter;
use crewboard_services::{LoadStatus, PaginationController};
use crewboard_store::{InMemoryStore, MeteredStore, Operation, Table};
use helpers::{seed_client, seed_people, seed_related, Fault, FaultyStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_first_page_of_1200_people() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 1200);
    let controller = PaginationController::new(Arc::new(store), 25);

    let page = controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(page.people.len(), 25);
    assert_eq!(page.info.total_count, 1200);
    assert_eq!(page.info.total_pages, 48);
    assert!(page.info.has_next_page);
    assert!(!page.info.has_previous_page);
    assert_eq!(page.people[0].person.person_code, "EMP-01199");
    assert_eq!(controller.page_info().get(), page.info);
    assert_eq!(controller.people().get().len(), 25);

    let last = controller.goto_page(47).await.unwrap().unwrap();
    assert_eq!(last.people.len(), 25);
    assert!(!last.info.has_next_page);
    assert!(last.info.has_previous_page);
    assert_eq!(last.people[24].person.person_code, "EMP-00000");

    assert!(controller.goto_page(48).await.unwrap().is_none());
    assert!(controller.next_page().await.unwrap().is_none());
    assert_eq!(controller.current_page(), 47);
}

#[tokio::test]
async fn test_empty_tenant_returns_empty_page() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "EMPTY_CORP");
    let metered = Arc::new(MeteredStore::new(Arc::new(store)));
    let controller = PaginationController::new(metered.clone(), 25);

    let page = controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap()
        .unwrap();

    assert!(page.people.is_empty());
    assert_eq!(page.info.total_count, 0);
    assert_eq!(page.info.total_pages, 0);
    assert!(!page.info.has_next_page);
    assert!(!page.info.has_previous_page);
    assert_eq!(metered.calls(Table::People, Operation::Count), 1);
    assert_eq!(metered.total(), 1);
    assert_eq!(controller.tracker().status().get(), LoadStatus::Idle);
}

#[tokio::test]
async fn test_missing_enrollments_are_explicit() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    let ids = seed_people(&store, tenant, 25);
    seed_related(&store, tenant, &ids[3..]);
    let controller = PaginationController::new(Arc::new(store), 25);

    let page = controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap()
        .unwrap();

    let enrolled = page.people.iter().filter(|p| p.enrollment.is_enrolled()).count();
    let absent = page
        .people
        .iter()
        .filter(|p| p.enrollment == EnrollmentState::NotEnrolled)
        .count();
    assert_eq!(enrolled, 22);
    assert_eq!(absent, 3);
    assert_eq!(page.report.enrolled, 22);
    assert_eq!(page.report.anomalies(), 0);
    assert!(page
        .people
        .iter()
        .filter(|p| p.enrollment.is_enrolled())
        .all(|p| p.documents.len() == 2 && p.tasks.len() == 1));
}

#[tokio::test]
async fn test_query_count_does_not_depend_on_page_size() {
    let mut totals = Vec::new();
    for page_size in [1u32, 25, 100] {
        let store = InMemoryStore::new();
        let tenant = seed_client(&store, "ACME_CORP");
        let ids = seed_people(&store, tenant, 120);
        seed_related(&store, tenant, &ids);
        let metered = Arc::new(MeteredStore::new(Arc::new(store)));
        let controller = PaginationController::new(metered.clone(), page_size);

        let page = controller
            .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.people.len(), page_size as usize);

        for table in [Table::PersonEnrollments, Table::DocumentStatus, Table::TaskStatus] {
            assert_eq!(metered.calls(table, Operation::Select), 1, "{} for page size {}", table, page_size);
        }
        totals.push(metered.total());
    }

    assert_eq!(totals, vec![5, 5, 5]);
}

#[tokio::test]
async fn test_cached_pages_and_count_are_reused() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 100);
    let metered = Arc::new(MeteredStore::new(Arc::new(store)));
    let controller = PaginationController::new(metered.clone(), 25);

    controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap();
    controller.next_page().await.unwrap();
    controller.next_page().await.unwrap();
    let back = controller.previous_page().await.unwrap().unwrap();

    assert!(back.from_cache);
    assert_eq!(back.info.current_page, 1);
    assert_eq!(back.info.loaded_pages, BTreeSet::from([0, 1, 2]));
    assert_eq!(metered.calls(Table::People, Operation::Count), 1);
    assert_eq!(metered.calls(Table::People, Operation::Select), 3);
}

#[tokio::test]
async fn test_reset_then_reload_yields_same_total() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 73);
    let controller = PaginationController::new(Arc::new(store), 25);
    let filter = PeopleFilter::default();

    let before = controller
        .load_page(&tenant.to_string(), 0, &filter)
        .await
        .unwrap()
        .unwrap();
    controller.next_page().await.unwrap();

    controller.reset();
    assert_eq!(controller.total_count(), None);
    assert!(controller.loaded_pages().is_empty());
    assert_eq!(controller.current_page(), 0);
    assert!(controller.people().get().is_empty());
    assert_eq!(controller.page_info().get().total_count, 0);

    let after = controller
        .load_page(&tenant.to_string(), 0, &filter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.info.total_count, before.info.total_count);
    assert_eq!(after.info.total_count, 73);
}

#[tokio::test]
async fn test_empty_search_equals_no_search() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 40);
    let controller = PaginationController::new(Arc::new(store), 25);

    let plain = controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap()
        .unwrap();
    for term in ["", "   "] {
        let searched = controller.search(term).await.unwrap().unwrap();
        assert_eq!(searched.info.total_count, plain.info.total_count);
        let ids = |page: &crewboard_services::PageResult| -> Vec<_> {
            page.people.iter().map(|p| p.person.id).collect()
        };
        assert_eq!(ids(&searched), ids(&plain));
    }
}

#[tokio::test]
async fn test_search_resets_cached_state() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 120);
    let controller = PaginationController::new(Arc::new(store), 25);

    controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap();
    controller.next_page().await.unwrap();
    assert_eq!(controller.loaded_pages(), BTreeSet::from([0, 1]));

    // "Person 1", "Person 10".."Person 19", "Person 100".."Person 119"
    let page = controller.search("person 1").await.unwrap().unwrap();
    assert_eq!(page.info.total_count, 31);
    assert_eq!(page.info.current_page, 0);
    assert_eq!(controller.loaded_pages(), BTreeSet::from([0]));
    assert!(page
        .people
        .iter()
        .all(|p| p.person.full_name.starts_with("Person 1")));
}

#[tokio::test]
async fn test_equality_filter_survives_search() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 40);
    let controller = PaginationController::new(Arc::new(store), 25);

    let engineering = PeopleFilter::default().with_eq("department", "Engineering");
    let page = controller
        .load_page(&tenant.to_string(), 0, &engineering)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(page.info.total_count, 20);

    let searched = controller.search("person 3").await.unwrap().unwrap();
    // Even-numbered people matching "person 3": 30, 32, 34, 36, 38
    assert_eq!(searched.info.total_count, 5);
    assert!(searched
        .people
        .iter()
        .all(|p| p.person.department == "Engineering"));
}

#[tokio::test]
async fn test_navigation_outside_range_is_ignored() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 30);
    let metered = Arc::new(MeteredStore::new(Arc::new(store)));
    let controller = PaginationController::new(metered.clone(), 25);

    assert!(controller.next_page().await.unwrap().is_none());
    assert_eq!(metered.total(), 0);

    controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap();
    let calls = metered.total();
    assert!(controller.previous_page().await.unwrap().is_none());
    assert!(controller.goto_page(2).await.unwrap().is_none());
    assert_eq!(metered.total(), calls);

    let second = controller.next_page().await.unwrap().unwrap();
    assert_eq!(second.people.len(), 5);
    assert!(!second.info.has_next_page);
    assert!(controller.next_page().await.unwrap().is_none());
    assert_eq!(controller.current_page(), 1);
}

#[tokio::test]
async fn test_invalid_tenant_id_fails_before_io() {
    let metered = Arc::new(MeteredStore::new(Arc::new(InMemoryStore::new())));
    let controller = PaginationController::new(metered.clone(), 25);

    for tenant in ["", "   ", "not-a-uuid"] {
        let err = controller
            .load_page(tenant, 0, &PeopleFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "{:?}", err);
    }
    assert_eq!(metered.total(), 0);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_search_without_tenant_is_invalid() {
    let controller = PaginationController::new(Arc::new(InMemoryStore::new()), 25);
    let err = controller.search("ada").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_failure_keeps_loaded_pages_and_clears_loading() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 60);
    let faulty = Arc::new(FaultyStore::new(Arc::new(store)));
    let controller = PaginationController::new(faulty.clone(), 25);

    controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap();

    faulty.fail(Fault::Select(Table::People));
    let err = controller.next_page().await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    assert!(!controller.is_loading());
    assert_eq!(controller.tracker().status().get(), LoadStatus::Error);
    let message = controller.tracker().error().get().unwrap();
    assert!(!message.contains("503"), "raw backend detail leaked: {}", message);
    assert_eq!(controller.loaded_pages(), BTreeSet::from([0]));
    assert_eq!(controller.current_page(), 0);
    assert_eq!(controller.people().get().len(), 25);

    faulty.heal();
    let retried = controller.next_page().await.unwrap().unwrap();
    assert_eq!(retried.info.current_page, 1);
    assert_eq!(controller.tracker().error().get(), None);
    assert_eq!(controller.tracker().status().get(), LoadStatus::Idle);
}

#[tokio::test]
async fn test_count_failure_clears_loading() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 10);
    let faulty = Arc::new(FaultyStore::new(Arc::new(store)));
    faulty.fail(Fault::Count(Table::People));
    let controller = PaginationController::new(faulty.clone(), 25);

    assert!(controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .is_err());
    assert!(!controller.is_loading());
    assert!(controller.loaded_pages().is_empty());
    assert_eq!(controller.total_count(), None);
}

#[tokio::test]
async fn test_page_requests_ignored_while_loading() {
    let store = InMemoryStore::new();
    let tenant = seed_client(&store, "ACME_CORP");
    seed_people(&store, tenant, 60);
    let faulty = Arc::new(FaultyStore::new(Arc::new(store)));
    let controller = PaginationController::new(faulty.clone(), 25);

    controller
        .load_page(&tenant.to_string(), 0, &PeopleFilter::default())
        .await
        .unwrap();

    faulty.delay_next_select(Table::People, Duration::from_millis(50));
    let (slow, ignored) = tokio::join!(controller.next_page(), controller.goto_page(2));

    assert_eq!(slow.unwrap().unwrap().info.current_page, 1);
    assert!(ignored.unwrap().is_none());
    assert_eq!(controller.current_page(), 1);
    assert!(!controller.is_loading());
}
