//! Filer Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! ```ignore
//! use filer_config::Config;
//!
//! let config = Config::from_file("configs/filer.toml")?;
//! config.validate()?;
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [connectors.kri_logs]
//! system = "GRC metric store"
//! source_type = "core_banking"
//! endpoint = "https://grc.internal/api/kri"
//!
//! [reports.osfi_monthly]
//! name = "OSFI operational risk report"
//! template_id = "osfi-op-risk"
//! frequency = "monthly"
//!
//! [[reports.osfi_monthly.mappings]]
//! source_type = "core_banking"
//! source_id = "kri_logs"
//! target_field = "kri_summary"
//! ```

mod audit;
mod connectors;
mod error;
mod global;
mod health;
mod logging;
mod reports;
mod store;
mod submission;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use audit::{AuditConfig, AuditSinkKind};
pub use connectors::{
    AuthConfig, AuthMethod, ConnectionKind, ConnectorConfig, ConnectorsConfig, DataFormat,
    SyncFrequency,
};
pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use health::HealthConfig;
pub use logging::LogConfig;
pub use reports::{MappingConfig, NotificationSettings, ReportConfig, ReportsConfig};
pub use store::{StoreConfig, StoreKind};
pub use submission::{
    BackoffKind, PayloadFormat, RetryPolicyConfig, SubmissionConfig, SubmissionTarget,
    TargetKind,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, except that a useful
/// deployment declares at least one connector and one report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (worker limits)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Report instance store
    pub store: StoreConfig,

    /// Integration audit log sink
    pub audit: AuditConfig,

    /// Health monitoring and circuit breaker settings
    pub health: HealthConfig,

    /// External system connectors
    pub connectors: ConnectorsConfig,

    /// Automated report configurations
    pub reports: ReportsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str(&contents)
    }

    /// Validate cross-section consistency
    ///
    /// Checks that mappings reference declared connectors, transformation
    /// and validation rules are well-formed, and schedules parse.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        Ok(config)
    }
}
