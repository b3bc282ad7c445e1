#![allow(dead_code)]

use async_trait::async_trait;
use crewboard_store::{
    InMemoryStore, OnConflict, Query, RemoteStore, StoreBackend, StoreError, StoreResult, Table,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Seed a client row and return its id
pub fn seed_client(store: &InMemoryStore, code: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.seed(
        Table::Clients,
        vec![json!({
            "id": id.to_string(),
            "client_code": code,
            "name": format!("{} Inc.", code),
            "status": "active",
            "created_at": "2024-01-01T00:00:00Z",
        })],
    );
    id
}

/// Seed `count` people (at most 1440); person `i` is created `i` minutes after midnight
pub fn seed_people(store: &InMemoryStore, client_id: Uuid, count: usize) -> Vec<Uuid> {
    let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
    let rows = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "id": id.to_string(),
                "client_id": client_id.to_string(),
                "employee_id": format!("EMP-{:05}", i),
                "first_name": "Person",
                "last_name": format!("{}", i),
                "full_name": format!("Person {}", i),
                "department": if i % 2 == 0 { "Engineering" } else { "Sales" },
                "employment_status": "active",
                "created_at": format!("2024-01-01T{:02}:{:02}:00Z", i / 60, i % 60),
            })
        })
        .collect();
    store.seed(Table::People, rows);
    ids
}

/// Seed one enrollment, two documents, and one task for each person
pub fn seed_related(store: &InMemoryStore, client_id: Uuid, person_ids: &[Uuid]) {
    store.seed(
        Table::PersonEnrollments,
        person_ids
            .iter()
            .map(|id| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "person_id": id.to_string(),
                    "client_id": client_id.to_string(),
                    "onboarding_completed": false,
                    "completion_percentage": 50.0,
                })
            })
            .collect(),
    );
    store.seed(
        Table::DocumentStatus,
        person_ids
            .iter()
            .flat_map(|id| {
                ["contract", "tax_form"].map(|kind| {
                    json!({
                        "id": Uuid::new_v4().to_string(),
                        "person_id": id.to_string(),
                        "client_id": client_id.to_string(),
                        "document_name": kind,
                        "document_type": kind,
                        "status": "pending",
                    })
                })
            })
            .collect(),
    );
    store.seed(
        Table::TaskStatus,
        person_ids
            .iter()
            .map(|id| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "person_id": id.to_string(),
                    "client_id": client_id.to_string(),
                    "title": "Set up workstation",
                    "status": "not_started",
                })
            })
            .collect(),
    );
}

/// Seed one application and one invitation for a client
pub fn seed_client_extras(store: &InMemoryStore, client_id: Uuid) {
    let application_id = Uuid::new_v4();
    store.seed(
        Table::Applications,
        vec![json!({
            "id": application_id.to_string(),
            "client_id": client_id.to_string(),
            "app_name": "Onboarding",
            "app_type": "onboarding",
            "status": "active",
        })],
    );
    store.seed(
        Table::Invitations,
        vec![json!({
            "id": Uuid::new_v4().to_string(),
            "client_id": client_id.to_string(),
            "application_id": application_id.to_string(),
            "email": "new.hire@example.com",
            "status": "pending",
            "created_at": "2024-02-01T00:00:00Z",
        })],
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Select(Table),
    Count(Table),
    /// Fail the `nth` (1-based) insert into `table`
    Insert { table: Table, nth: usize },
}

/// Store wrapper that injects failures and delays
pub struct FaultyStore {
    inner: Arc<dyn RemoteStore>,
    fault: Mutex<Option<Fault>>,
    delay: Mutex<Option<(Table, Duration)>>,
    inserts: Mutex<HashMap<Table, usize>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn RemoteStore>) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
            delay: Mutex::new(None),
            inserts: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
        self.inserts.lock().unwrap().clear();
    }

    pub fn heal(&self) {
        *self.fault.lock().unwrap() = None;
    }

    /// Delay the next select on `table` by `duration`
    pub fn delay_next_select(&self, table: Table, duration: Duration) {
        *self.delay.lock().unwrap() = Some((table, duration));
    }

    fn fault(&self) -> Option<Fault> {
        *self.fault.lock().unwrap()
    }

    fn injected(table: Table) -> StoreError {
        StoreError::Status {
            status: 503,
            message: format!("injected failure on {}", table),
        }
    }
}

#[async_trait]
impl RemoteStore for FaultyStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        if self.fault() == Some(Fault::Select(table)) {
            return Err(Self::injected(table));
        }
        let delay = {
            let mut delay = self.delay.lock().unwrap();
            match *delay {
                Some((delayed, duration)) if delayed == table => {
                    *delay = None;
                    Some(duration)
                }
                _ => None,
            }
        };
        if let Some(duration) = delay {
            tokio::time::sleep(duration).await;
        }
        self.inner.select(table, query).await
    }

    async fn count(&self, table: Table, query: &Query) -> StoreResult<u64> {
        if self.fault() == Some(Fault::Count(table)) {
            return Err(Self::injected(table));
        }
        self.inner.count(table, query).await
    }

    async fn insert(
        &self,
        table: Table,
        rows: Vec<Value>,
        on_conflict: &OnConflict,
    ) -> StoreResult<Vec<Value>> {
        let call = {
            let mut inserts = self.inserts.lock().unwrap();
            let count = inserts.entry(table).or_insert(0);
            *count += 1;
            *count
        };
        if let Some(Fault::Insert { table: failing, nth }) = self.fault() {
            if failing == table && nth == call {
                return Err(Self::injected(table));
            }
        }
        self.inner.insert(table, rows, on_conflict).await
    }

    fn backend_type(&self) -> StoreBackend {
        self.inner.backend_type()
    }
}
