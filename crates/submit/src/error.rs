//! Error types for submission

use thiserror::Error;

/// Errors that can occur while submitting a report
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The target rejected the submission; retrying cannot help
    /// (bad credentials, malformed payload, 4xx)
    #[error("submission to '{target}' rejected: {message}")]
    Rejected {
        /// Target name
        target: String,
        /// Rejection detail
        message: String,
    },

    /// Transient delivery failure; retryable (network, timeout, 5xx)
    #[error("transient submission failure to '{target}': {message}")]
    Transient {
        /// Target name
        target: String,
        /// Failure detail
        message: String,
    },

    /// The instance was already submitted and `force` was not set
    #[error("report instance '{0}' is already submitted")]
    AlreadySubmitted(String),

    /// Payload rendering failed
    #[error("failed to render {format} payload: {message}")]
    Render {
        /// Requested payload format
        format: &'static str,
        /// Failure detail
        message: String,
    },
}

impl SubmitError {
    /// Whether the retry policy applies to this error
    pub fn is_transient(&self) -> bool {
        matches!(self, SubmitError::Transient { .. })
    }
}
