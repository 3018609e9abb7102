//! Error types for connectors

use thiserror::Error;

/// Errors that can occur during connector operations
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Failed to initialize connector (e.g., HTTP client creation failed)
    #[error("failed to initialize connector: {0}")]
    Init(String),

    /// The source endpoint is unreachable or returned a server error
    #[error("source '{connector}' unavailable: {message}")]
    SourceUnavailable {
        /// Connector id
        connector: String,
        /// Underlying failure detail
        message: String,
    },

    /// Credentials were rejected or have expired
    #[error("authentication failed for '{connector}': {message}")]
    AuthFailure {
        /// Connector id
        connector: String,
        /// Rejection detail
        message: String,
    },

    /// The connection kind has no registered client implementation
    #[error("unsupported source type '{kind}' on connector '{connector}'")]
    UnsupportedSourceType {
        /// Connector id
        connector: String,
        /// The unsupported connection kind
        kind: &'static str,
    },

    /// The source responded with a body the fetcher cannot interpret
    #[error("invalid response from '{connector}': {message}")]
    InvalidResponse {
        /// Connector id
        connector: String,
        /// Parse failure detail
        message: String,
    },

    /// A connector id was not found in the registry
    #[error("unknown connector '{0}'")]
    Unknown(String),
}

impl ConnectorError {
    /// Whether retrying the operation could help
    ///
    /// Only availability problems are retryable; auth and configuration
    /// failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::SourceUnavailable { .. })
    }
}
