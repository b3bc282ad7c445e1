mod helpers;

use crewboard_core::models::ClientRow;
use crewboard_core::AppError;
use crewboard_db::{ClientRepository, PersonRepository};
use crewboard_services::{
    employee_id, synthesize_person, BatchProgress, DemoGenerator, GenerationPlan, GeneratorOptions,
};
use crewboard_store::{InMemoryStore, RemoteStore, Table};
use helpers::{seed_client, Fault, FaultyStore};
use std::sync::Arc;

async fn client(store: Arc<dyn RemoteStore>, code: &str) -> ClientRow {
    ClientRepository::new(store)
        .get_by_code(code)
        .await
        .unwrap()
        .unwrap()
}

fn people_only() -> GeneratorOptions {
    GeneratorOptions {
        with_related: false,
        ..GeneratorOptions::default()
    }
}

#[tokio::test]
async fn test_generates_target_in_fixed_batches() {
    let store = InMemoryStore::new();
    seed_client(&store, "ACME_CORP");
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let acme = client(shared.clone(), "ACME_CORP").await;
    let generator = DemoGenerator::new(shared, people_only());

    let mut batches: Vec<BatchProgress> = Vec::new();
    let report = generator
        .run(&acme, &GenerationPlan::new(1200, 100), |progress| batches.push(*progress))
        .await
        .unwrap();

    assert_eq!(batches.len(), 12);
    assert!(batches.iter().all(|b| b.inserted == 100 && b.batches == 12));
    assert_eq!(batches[6].batch, 7);
    assert_eq!(batches[6].committed, 700);
    assert_eq!(report.batches_run, 12);
    assert_eq!(report.people_inserted, 1200);
    assert_eq!(report.committed, 1200);
    assert_eq!(store.len(Table::People), 1200);
}

#[tokio::test]
async fn test_failed_batch_reports_range_and_resume_is_idempotent() {
    let store = InMemoryStore::new();
    seed_client(&store, "ACME_CORP");
    let faulty = Arc::new(FaultyStore::new(Arc::new(store.clone())));
    let acme = client(faulty.clone(), "ACME_CORP").await;
    let generator = DemoGenerator::new(faulty.clone(), people_only());
    let plan = GenerationPlan::new(1200, 100);

    faulty.fail(Fault::Insert {
        table: Table::People,
        nth: 7,
    });
    let mut committed_batches = 0;
    let err = generator
        .run(&acme, &plan, |_| committed_batches += 1)
        .await
        .unwrap_err();

    match err {
        AppError::BatchInsertFailed {
            batch,
            start,
            end,
            committed,
            ..
        } => {
            assert_eq!(batch, 7);
            assert_eq!((start, end), (600, 700));
            assert_eq!(committed, 600);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(committed_batches, 6);
    assert_eq!(store.len(Table::People), 600);

    faulty.heal();
    let resumed = plan.resume_from(store.len(Table::People));
    let report = generator.run(&acme, &resumed, |_| {}).await.unwrap();
    assert_eq!(report.batches_run, 6);
    assert_eq!(report.people_inserted, 600);
    assert_eq!(store.len(Table::People), 1200);

    // Re-running every batch inserts nothing new
    let report = generator.run(&acme, &plan, |_| {}).await.unwrap();
    assert_eq!(report.batches_run, 12);
    assert_eq!(report.people_inserted, 0);
    assert_eq!(store.len(Table::People), 1200);
}

#[tokio::test]
async fn test_related_rows_follow_each_batch() {
    let store = InMemoryStore::new();
    seed_client(&store, "ACME_CORP");
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let acme = client(shared.clone(), "ACME_CORP").await;
    let generator = DemoGenerator::new(shared, GeneratorOptions::default());
    let plan = GenerationPlan::new(200, 100);

    let report = generator.run(&acme, &plan, |_| {}).await.unwrap();

    assert_eq!(report.people_inserted, 200);
    assert_eq!(report.documents_inserted, 800);
    assert_eq!(report.tasks_inserted, 800);
    assert!(report.enrollments_inserted > 150 && report.enrollments_inserted < 200);
    assert_eq!(store.len(Table::PersonEnrollments), report.enrollments_inserted);

    let again = generator.run(&acme, &plan, |_| {}).await.unwrap();
    assert_eq!(again.people_inserted, 0);
    assert_eq!(again.enrollments_inserted, 0);
    assert_eq!(again.documents_inserted, 0);
    assert_eq!(again.tasks_inserted, 0);
}

#[tokio::test]
async fn test_related_failure_resumes_related_rows() {
    let store = InMemoryStore::new();
    seed_client(&store, "ACME_CORP");
    let faulty = Arc::new(FaultyStore::new(Arc::new(store.clone())));
    let acme = client(faulty.clone(), "ACME_CORP").await;
    let generator = DemoGenerator::new(faulty.clone(), GeneratorOptions::default());
    let plan = GenerationPlan::new(300, 100);

    faulty.fail(Fault::Insert {
        table: Table::TaskStatus,
        nth: 2,
    });
    let err = generator.run(&acme, &plan, |_| {}).await.unwrap_err();
    assert!(matches!(err, AppError::BatchInsertFailed { batch: 2, committed: 100, .. }));
    assert_eq!(store.len(Table::People), 200);
    assert_eq!(store.len(Table::TaskStatus), 400);

    faulty.heal();
    let report = generator
        .run(&acme, &plan.resume_from(100), |_| {})
        .await
        .unwrap();
    assert_eq!(report.people_inserted, 100);
    assert_eq!(report.tasks_inserted, 800);
    assert_eq!(store.len(Table::TaskStatus), 1200);
}

#[tokio::test]
async fn test_overwrite_rewrites_existing_rows() {
    let store = InMemoryStore::new();
    seed_client(&store, "ACME_CORP");
    let shared: Arc<dyn RemoteStore> = Arc::new(store.clone());
    let acme = client(shared.clone(), "ACME_CORP").await;
    let plan = GenerationPlan::new(20, 10);

    DemoGenerator::new(shared.clone(), GeneratorOptions { seed: 1, ..people_only() })
        .run(&acme, &plan, |_| {})
        .await
        .unwrap();
    let ids: Vec<String> = (0..20).map(|i| employee_id("ACME_CORP", i)).collect();
    let people = PersonRepository::new(shared.clone());
    let before = people.find_by_employee_ids(acme.id, &ids).await.unwrap();

    let skipped = DemoGenerator::new(shared.clone(), GeneratorOptions { seed: 2, ..people_only() })
        .run(&acme, &plan, |_| {})
        .await
        .unwrap();
    assert_eq!(skipped.people_inserted, 0);

    let rewritten = DemoGenerator::new(
        shared.clone(),
        GeneratorOptions {
            seed: 2,
            overwrite: true,
            ..people_only()
        },
    )
    .run(&acme, &plan, |_| {})
    .await
    .unwrap();
    assert_eq!(rewritten.people_inserted, 20);
    assert_eq!(store.len(Table::People), 20);

    let after = people.find_by_employee_ids(acme.id, &ids).await.unwrap();
    for row in &after {
        let code = row.employee_id.clone().unwrap();
        let index: usize = code.rsplit('-').next().unwrap().parse().unwrap();
        assert_eq!(row.email.as_deref(), Some(synthesize_person(&acme, 2, index).email.as_str()));
        let original = before.iter().find(|p| p.employee_id == row.employee_id).unwrap();
        assert_eq!(original.id, row.id);
    }
}
