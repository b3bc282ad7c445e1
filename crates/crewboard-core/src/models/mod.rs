//! Data models for the application
//!
//! Each entity comes in two shapes: the `*Row` type mirrors the backend table
//! (snake_case columns, every non-key column optional) and the view type is what the
//! dashboard consumes (camelCase, canonical enums, no missing values). The
//! `crate::transform` module converts between them.

mod application;
mod client;
mod document;
mod enrollment;
mod invitation;
mod overview;
mod person;
mod task;

// Re-export all models for convenient imports
pub use application::*;
pub use client::*;
pub use document::*;
pub use enrollment::*;
pub use invitation::*;
pub use overview::*;
pub use person::*;
pub use task::*;
