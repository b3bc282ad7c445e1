//! Crewboard data access layer
//!
//! Typed repositories over a [`crewboard_store::RemoteStore`]. Every query against a
//! tenant-owned table is scoped by the tenant's client id, and related collections are
//! fetched with one in-list query per collection.

pub mod db;

pub use db::*;
