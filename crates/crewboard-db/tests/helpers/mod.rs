use crewboard_store::{InMemoryStore, Table};
use serde_json::json;
use uuid::Uuid;

/// Seed a client row and return its id
pub fn seed_client(store: &InMemoryStore, code: &str, created_at: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.seed(
        Table::Clients,
        vec![json!({
            "id": id.to_string(),
            "client_code": code,
            "name": format!("{} Inc.", code),
            "status": "active",
            "created_at": created_at,
        })],
    );
    id
}

/// Seed `count` people for a client; person `i` is created `i` minutes after midnight
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
