//! Filer - Pipeline
//!
//! One pipeline run: aggregate every source of a report configuration,
//! generate the versioned instance, and (when configured) submit it -
//! with cooperative cancellation at each stage boundary.
//!
//! # Architecture
//!
//! ```text
//! [Scheduler tick]
//!       │
//!       ▼
//!  PipelineRunner ──► Aggregator ──► fetch → transform → validate
//!       │                                   (per mapping)
//!       ├──► generate (instance + artifacts)
//!       ├──► store.create / store.update
//!       ├──► SubmissionEngine (auto_submit)
//!       └──► AuditLog + notifications
//! ```
//!
//! Every run produces a report instance with an explicit status and
//! error/warning lists; there is no silent-success path. The audit log is
//! the single append-only trail for every fetch/transform/validate/
//! submit/health event.

mod error;
mod notify;
mod runner;

pub use error::PipelineError;
pub use filer_connectors::{
    AuditEvent, AuditEventKind, AuditLog, AuditStatus, FileAuditLog, MemoryAuditLog,
};
pub use notify::{LogNotifier, Notifier};
pub use runner::{PipelineRunner, RunOutcome, RunPipeline};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
