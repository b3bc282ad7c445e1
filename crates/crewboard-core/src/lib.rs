//! Crewboard Core Library
//!
//! This crate provides the domain models, the row-to-view transform layer, error types,
//! configuration, and the persisted settings blob shared by all Crewboard components.
//! Nothing in here performs I/O against the remote store.

pub mod config;
pub mod error;
pub mod models;
pub mod settings;
pub mod transform;

// Re-export commonly used types
pub use config::{Config, StoreBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use settings::{migrate_settings, Settings, SETTINGS_KEY, SETTINGS_VERSION};
