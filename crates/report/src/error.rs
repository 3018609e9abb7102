//! Error types for aggregation and generation

use filer_connectors::ConnectorError;
use thiserror::Error;

/// Errors that can occur while aggregating or generating a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// A mapping flagged `required` could not be fetched
    #[error("required source '{source}' failed: {cause}")]
    RequiredSourceFailed {
        /// Connector id of the failing source
        source: String,
        /// The underlying connector error
        #[source]
        cause: ConnectorError,
    },

    /// The run was cancelled at a stage boundary
    #[error("run cancelled")]
    Cancelled,

    /// The instance store failed
    #[error("report store error: {0}")]
    Store(String),

    /// An instance id was not found in the store
    #[error("unknown report instance '{0}'")]
    UnknownInstance(String),

    /// Payload serialization failed
    #[error("failed to build report payload: {0}")]
    Payload(String),

    /// An instance that is already submitted cannot be modified
    #[error("report instance '{0}' is already submitted and immutable")]
    Immutable(String),
}
