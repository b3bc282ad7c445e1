//! Crewboard Store Library
//!
//! This crate defines the remote store contract consumed by the data-loading layer and
//! its implementations: the hosted database's REST interface and a process-local store.
//!
//! # Query contract
//!
//! - `select(table, query)` returns matching rows, honoring ordering and range
//! - `count(table, query)` returns the exact number of matching rows without rows
//! - `insert(table, rows, on_conflict)` inserts and returns the inserted representation
//!
//! Every backend reports failures as a [`StoreError`], whether the failure was a transport
//! error or an error payload returned by the backend.

pub mod factory;
#[cfg(feature = "store-memory")]
pub mod memory;
pub mod metered;
pub mod query;
#[cfg(feature = "store-rest")]
pub mod rest;
pub mod traits;

// Re-export commonly used types
pub use crewboard_core::StoreBackend;
pub use factory::create_store;
#[cfg(feature = "store-memory")]
pub use memory::InMemoryStore;
pub use metered::{MeteredStore, Operation};
pub use query::{Direction, Filter, OnConflict, Order, Query, Range};
#[cfg(feature = "store-rest")]
pub use rest::RestStore;
pub use traits::{decode_rows, encode_rows, RemoteStore, StoreError, StoreResult, Table};
