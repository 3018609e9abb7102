//! Runtime connector state

use chrono::{DateTime, Utc};
use filer_config::ConnectorConfig;
use serde::Serialize;

/// Operational status of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    /// Syncing normally
    Active,
    /// Administratively disabled
    Inactive,
    /// Failing; the health monitor has flagged it
    Error,
    /// Under connectivity testing, excluded from scheduling
    Testing,
}

/// A connector plus its runtime counters
///
/// Status and error counters change only through the methods below, which
/// the registry exposes to the health monitor and scheduler; nothing else
/// mutates them.
#[derive(Debug)]
pub struct Connector {
    /// Connector id (config key)
    pub id: String,

    /// Static configuration
    pub config: ConnectorConfig,

    status: ConnectorStatus,
    error_count: u32,
    success_count: u64,
    failure_count: u64,
    last_sync: Option<DateTime<Utc>>,
    next_sync: Option<DateTime<Utc>>,
}

impl Connector {
    /// Create a connector in the `Active` state
    pub fn new(id: impl Into<String>, config: ConnectorConfig) -> Self {
        Self {
            id: id.into(),
            config,
            status: ConnectorStatus::Active,
            error_count: 0,
            success_count: 0,
            failure_count: 0,
            last_sync: None,
            next_sync: None,
        }
    }

    /// Current status
    pub fn status(&self) -> ConnectorStatus {
        self.status
    }

    /// Consecutive error count since the last successful health check
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Rolling success rate over all recorded operations (0.0..=1.0)
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            1.0
        } else {
            self.success_count as f64 / total as f64
        }
    }

    /// Record a successful sync
    pub(crate) fn record_success(&mut self, at: DateTime<Utc>) {
        self.success_count += 1;
        self.last_sync = Some(at);
    }

    /// Record a failed sync
    pub(crate) fn record_failure(&mut self) {
        self.failure_count += 1;
        self.error_count += 1;
    }

    /// Reset the consecutive error count
    ///
    /// Only called on an explicit successful health check.
    pub(crate) fn reset_errors(&mut self) {
        self.error_count = 0;
    }

    /// Transition the status
    pub(crate) fn set_status(&mut self, status: ConnectorStatus) {
        self.status = status;
    }

    /// Record the next scheduled sync time
    pub(crate) fn set_next_sync(&mut self, at: Option<DateTime<Utc>>) {
        self.next_sync = at;
    }

    /// Point-in-time view for display and audit
    pub fn snapshot(&self) -> ConnectorSnapshot {
        ConnectorSnapshot {
            id: self.id.clone(),
            system: self.config.system.clone(),
            status: self.status,
            error_count: self.error_count,
            success_rate: self.success_rate(),
            last_sync: self.last_sync,
            next_sync: self.next_sync,
        }
    }
}

/// Immutable view of a connector's runtime state
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorSnapshot {
    pub id: String,
    pub system: String,
    pub status: ConnectorStatus,
    pub error_count: u32,
    pub success_rate: f64,
    pub last_sync: Option<DateTime<Utc>>,
    pub next_sync: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectorConfig {
        let toml = r#"
system = "GRC metric store"
source_type = "core_banking"
endpoint = "https://grc.internal/api"
"#;
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_new_connector_is_active() {
        let c = Connector::new("kri", config());
        assert_eq!(c.status(), ConnectorStatus::Active);
        assert_eq!(c.error_count(), 0);
        assert_eq!(c.success_rate(), 1.0);
    }

    #[test]
    fn test_success_rate_tracks_failures() {
        let mut c = Connector::new("kri", config());
        c.record_success(Utc::now());
        c.record_success(Utc::now());
        c.record_failure();
        c.record_failure();
        assert_eq!(c.success_rate(), 0.5);
        assert_eq!(c.error_count(), 2);
    }

    #[test]
    fn test_reset_errors_clears_consecutive_count_only() {
        let mut c = Connector::new("kri", config());
        c.record_failure();
        c.record_failure();
        c.reset_errors();
        assert_eq!(c.error_count(), 0);
        // Rolling rate still remembers the failures
        assert!(c.success_rate() < 1.0);
    }
}
