//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A report mapping references a connector that is not declared
    #[error("report '{report}' references unknown connector '{connector}'")]
    UnknownConnector {
        /// Report id with the dangling reference
        report: String,
        /// Missing connector id
        connector: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "connector", "report")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Invalid cron schedule expression
    #[error("invalid schedule '{schedule}' on '{name}': {message}")]
    InvalidSchedule {
        /// Component carrying the schedule
        name: String,
        /// The schedule expression
        schedule: String,
        /// Parser error
        message: String,
    },

    /// A transformation rule failed its well-formedness check
    #[error("report '{report}', mapping '{mapping}': {message}")]
    InvalidTransform {
        /// Report id
        report: String,
        /// Mapping target field
        mapping: String,
        /// Rule error
        message: String,
    },

    /// A validation rule failed its well-formedness check
    #[error("report '{report}': {message}")]
    InvalidRule {
        /// Report id
        report: String,
        /// Rule error
        message: String,
    },
}

impl ConfigError {
    /// Create an UnknownConnector error
    pub fn unknown_connector(report: impl Into<String>, connector: impl Into<String>) -> Self {
        Self::UnknownConnector {
            report: report.into(),
            connector: connector.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_connector_error() {
        let err = ConfigError::unknown_connector("osfi_monthly", "kri_logs");
        assert!(err.to_string().contains("osfi_monthly"));
        assert!(err.to_string().contains("kri_logs"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("connector", "kri_logs", "endpoint");
        assert!(err.to_string().contains("connector"));
        assert!(err.to_string().contains("endpoint"));
    }
}
