//! Filer - Report
//!
//! Turns fetched source data into versioned report instances.
//!
//! # Overview
//!
//! The [`Aggregator`] walks every data source mapping of a report
//! configuration: fetch, transform, validate-and-remediate. It tolerates
//! partial source failure (a non-required source that is unavailable is
//! zero-weighted and recorded as a warning) and produces per-source and
//! overall data-quality scores.
//!
//! The generator turns an aggregation result into a [`ReportInstance`]
//! with calendar-derived period and due date, a JSON payload, and
//! checksummed artifacts.
//!
//! The [`ReportStore`] trait abstracts the durable instance store;
//! in-memory and file-backed implementations ship for tests and
//! single-node deployments.

mod aggregator;
mod error;
mod generator;
mod instance;
mod store;

pub use aggregator::{AggregationResult, Aggregator, QualityScore, SourceSummary};
pub use error::ReportError;
pub use generator::{error_instance, generate, verify_artifact};
pub use instance::{ArtifactRef, InstanceStatus, ReportInstance};
pub use store::{FileStore, MemoryStore, ReportStore};

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
