//! Error types for transformation

use thiserror::Error;

/// Errors that can occur while transforming a record
#[derive(Debug, Error)]
pub enum TransformError {
    /// A calculation rule failed to evaluate
    #[error("calculation for '{target_field}' failed: {message}")]
    Calculation {
        /// Target field of the failing rule
        target_field: String,
        /// What went wrong (parse error, undefined field, division by zero)
        message: String,
    },

    /// A conditional rule matched no case and declared no default
    #[error("no condition matched for '{target_field}' and no default is declared")]
    NoMatchingCondition {
        /// Target field of the failing rule
        target_field: String,
    },

    /// A format rule could not convert the source value
    #[error("cannot format field '{field}': {message}")]
    Format {
        /// Source field of the failing rule
        field: String,
        /// Why formatting failed
        message: String,
    },

    /// Invalid rule configuration (bad expression, bad condition)
    #[error("invalid transformation rule: {0}")]
    Config(String),
}
