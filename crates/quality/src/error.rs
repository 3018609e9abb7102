//! Error types for data quality

use thiserror::Error;

/// Errors that can occur during validation and remediation
#[derive(Debug, Error)]
pub enum QualityError {
    /// A remediation was applied but the rule still fails
    #[error("remediation for rule '{rule}' did not resolve the failure")]
    RemediationFailed {
        /// Id of the rule that stayed failing
        rule: String,
    },

    /// An external lookup during remediation failed
    #[error("remediation lookup '{key}' failed: {message}")]
    LookupFailed {
        /// Lookup key that was requested
        key: String,
        /// Provider error message
        message: String,
    },

    /// Invalid rule configuration
    #[error("invalid validation rule: {0}")]
    Config(String),
}
