//! Connector configuration types
//!
//! Each named connector describes one external system: where it lives,
//! how to authenticate, and how often to sync.
//!
//! # Example
//!
//! ```toml
//! [connectors.kri_logs]
//! system = "GRC metric store"
//! source_type = "core_banking"
//! connection = "rest"
//! endpoint = "https://grc.internal/api/kri"
//! data_format = "json"
//!
//! [connectors.kri_logs.auth]
//! type = "bearer"
//! token = "${GRC_TOKEN}"
//!
//! [connectors.kri_logs.sync]
//! mode = "scheduled"
//! schedule = "0 0 */6 * * *"
//! ```

use chrono::{DateTime, Utc};
use filer_record::SourceType;
use serde::Deserialize;
use std::collections::HashMap;

/// Container for all connector configurations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectorsConfig {
    /// Named connector instances
    #[serde(flatten)]
    connectors: HashMap<String, ConnectorConfig>,
}

impl ConnectorsConfig {
    /// Get a connector config by id
    pub fn get(&self, id: &str) -> Option<&ConnectorConfig> {
        self.connectors.get(id)
    }

    /// Check if a connector exists
    pub fn contains(&self, id: &str) -> bool {
        self.connectors.contains_key(id)
    }

    /// Iterate over all connectors
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConnectorConfig)> {
        self.connectors.iter()
    }

    /// Get the number of configured connectors
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Check if no connectors are configured
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Get all connector ids
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.connectors.keys()
    }
}

/// How the connector reaches the external system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// HTTP REST endpoint (implemented)
    #[default]
    Rest,
    /// SOAP endpoint (structurally supported, pluggable)
    Soap,
    /// Direct database connection (pluggable)
    Database,
    /// File transfer drop zone (pluggable)
    FileTransfer,
    /// Message queue subscription (pluggable)
    MessageQueue,
}

/// Wire format of the source data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

/// Authentication method for a connector endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    /// No authentication
    #[default]
    None,
    /// Bearer token in the Authorization header
    Bearer { token: String },
    /// API key in a named header
    ApiKey { header: String, key: String },
    /// HTTP basic auth
    Basic { username: String, password: String },
    /// Client certificate (path to bundle)
    Certificate { path: String },
}

/// Authentication configuration with optional credential expiry
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AuthConfig {
    /// The authentication method
    #[serde(flatten)]
    pub method: AuthMethod,

    /// When the credential expires, if known
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthConfig {
    /// Check whether the credential is expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// When the connector syncs
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SyncFrequency {
    /// Continuous; the scheduler treats it as always due
    RealTime,
    /// Cron-driven (6-field expression with seconds)
    Scheduled { schedule: String },
    /// Only on explicit operator request
    #[default]
    Manual,
}

/// One external system connector
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Human-readable system name
    pub system: String,

    /// Kind of data this system provides
    pub source_type: SourceType,

    /// How the system is reached
    #[serde(default)]
    pub connection: ConnectionKind,

    /// Endpoint address (URL for rest/soap)
    pub endpoint: String,

    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Wire format of the source data
    #[serde(default)]
    pub data_format: DataFormat,

    /// Sync cadence
    #[serde(default)]
    pub sync: SyncFrequency,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retry attempts for transient fetch failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_connectors() {
        let config: ConnectorsConfig = toml::from_str("").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_full_connector() {
        let toml = r#"
[kri_logs]
system = "GRC metric store"
source_type = "core_banking"
connection = "rest"
endpoint = "https://grc.internal/api/kri"
data_format = "json"
timeout_secs = 10

[kri_logs.auth]
type = "bearer"
token = "secret"

[kri_logs.sync]
mode = "scheduled"
schedule = "0 0 */6 * * *"
"#;
        let config: ConnectorsConfig = toml::from_str(toml).unwrap();
        let connector = config.get("kri_logs").unwrap();
        assert_eq!(connector.source_type, filer_record::SourceType::CoreBanking);
        assert_eq!(connector.connection, ConnectionKind::Rest);
        assert_eq!(connector.timeout_secs, 10);
        assert_eq!(
            connector.auth.method,
            AuthMethod::Bearer { token: "secret".into() }
        );
        assert_eq!(
            connector.sync,
            SyncFrequency::Scheduled { schedule: "0 0 */6 * * *".into() }
        );
    }

    #[test]
    fn test_defaults() {
        let toml = r#"
[incidents]
system = "Incident tracker"
source_type = "incident"
endpoint = "https://itsm.internal/api"
"#;
        let config: ConnectorsConfig = toml::from_str(toml).unwrap();
        let connector = config.get("incidents").unwrap();
        assert_eq!(connector.connection, ConnectionKind::Rest);
        assert_eq!(connector.auth.method, AuthMethod::None);
        assert_eq!(connector.sync, SyncFrequency::Manual);
        assert_eq!(connector.timeout_secs, 30);
        assert_eq!(connector.max_retries, 3);
    }

    #[test]
    fn test_auth_expiry() {
        let auth = AuthConfig {
            method: AuthMethod::Bearer { token: "t".into() },
            expires_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
        };
        assert!(auth.is_expired("2024-06-01T00:00:00Z".parse().unwrap()));
        assert!(!auth.is_expired("2023-06-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn test_unknown_connection_kind_rejected() {
        let toml = r#"
[x]
system = "s"
source_type = "incident"
connection = "carrier_pigeon"
endpoint = "e"
"#;
        let parsed: std::result::Result<ConnectorsConfig, _> = toml::from_str(toml);
        assert!(parsed.is_err());
    }
}
