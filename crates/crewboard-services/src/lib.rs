//! Crewboard Services Layer
//!
//! The data-loading core of the dashboard. Data flows leaf to root:
//!
//! - [`association`]: attaches enrollments, documents, and tasks to a page of people with
//!   one in-list query per related collection
//! - [`pagination`]: page size, current page, cached counts and pages
//! - [`orchestrator`]: the staged dashboard load with progress reporting
//! - [`generator`]: batched, resumable demo data insertion
//!
//! Observable state shared with the presentation layer lives in [`state`].

pub mod association;
pub mod generator;
pub mod orchestrator;
pub mod pagination;
pub mod progress;
pub mod state;

pub use association::{AssociationLoader, LoadReport, RelatedRows, RELATED_COLLECTIONS};
pub use generator::{
    employee_id, synthesize_person, BatchProgress, DemoGenerator, GenerationPlan, GenerationReport,
    GeneratorOptions,
};
pub use orchestrator::{DashboardLoader, LoadOutcome, LoadSummary};
pub use pagination::{PageInfo, PageResult, PaginationController};
pub use progress::{Progress, ProgressSink, Stage};
pub use state::{DashboardState, LoadStatus, LoadTicket, LoadTracker, LoadingGuard, Observable};

use crewboard_core::{AppError, ErrorMetadata, LogLevel};

/// Log an error at the level its metadata asks for
pub(crate) fn log_error(context: &str, err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error_code = err.error_code(), "{}: {}", context, err),
        LogLevel::Warn => tracing::warn!(error_code = err.error_code(), "{}: {}", context, err),
        LogLevel::Error => tracing::error!(error_code = err.error_code(), "{}: {}", context, err),
    }
}
