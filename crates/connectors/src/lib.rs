//! Filer - Connectors
//!
//! Connectors encapsulate one external system each: endpoint, auth,
//! data format, and sync cadence. The fetcher pulls raw records from a
//! connector for a reporting period; the registry tracks runtime state
//! (status, error counts, success rate) per connector.
//!
//! # Design Principles
//!
//! - **Pull-based**: data is fetched on schedule or on demand, never pushed
//! - **Per-connector state**: the registry shards its locks per entry so
//!   unrelated connectors never serialize on each other
//! - **Restricted status transitions**: connector status changes go
//!   through the registry's explicit mutators, driven by the health
//!   monitor and scheduler only
//! - **Structural pluggability**: REST sources are implemented; database,
//!   file-transfer, and message-queue kinds are dispatched through the
//!   `SourceClient` trait and report `UnsupportedSourceType` until an
//!   implementation is registered
//! - **Single audit trail**: every integration event (fetch, validate,
//!   submit, health check, webhook test) lands in the append-only
//!   [`AuditLog`]

mod audit;
mod connector;
mod error;
mod fetch;
mod registry;
pub mod resilience;
mod webhook;

pub use audit::{
    AuditEvent, AuditEventKind, AuditLog, AuditStatus, FileAuditLog, MemoryAuditLog,
};
pub use connector::{Connector, ConnectorSnapshot, ConnectorStatus};
pub use error::ConnectorError;
pub use fetch::{DataFetcher, Fetcher, SourceClient};
pub use registry::ConnectorRegistry;
pub use webhook::{test_webhook, WebhookTestResult};

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
