//! Error types for health monitoring

use thiserror::Error;

/// Errors that can occur during health monitoring
#[derive(Debug, Error)]
pub enum HealthError {
    /// A connector id was not found in the registry
    #[error("unknown connector '{0}'")]
    UnknownConnector(String),

    /// Probe client construction failed
    #[error("failed to initialize prober: {0}")]
    Init(String),
}
