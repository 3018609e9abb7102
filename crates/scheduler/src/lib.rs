//! Filer - Scheduler
//!
//! Time-based dispatch for the reporting pipeline. Holds no business
//! logic: it only decides *when* a report runs or a connector syncs, and
//! enforces that the same report configuration never runs concurrently
//! with itself.
//!
//! # Design
//!
//! - Each report config ticks on its frequency-derived (or overridden)
//!   cron schedule; each spawned run is an isolated task
//! - A per-config atomic run guard skips overdue ticks with a logged
//!   warning instead of overlapping the in-flight run
//! - Connectors with a scheduled sync cadence tick independently; a sync
//!   is skipped while the connector's circuit is open
//! - Shutdown cancels the token; in-flight runs stop at their next stage
//!   boundary and are never marked submitted

mod error;
mod scheduler;

pub use error::SchedulerError;
pub use scheduler::{ScheduledReport, Scheduler};

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
