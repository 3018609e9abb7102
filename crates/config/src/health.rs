//! Health monitoring configuration

use serde::Deserialize;
use std::time::Duration;

/// Health monitor and circuit breaker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Seconds between health probe sweeps
    pub check_interval_secs: u64,

    /// Consecutive probe failures before a connector's circuit opens
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before allowing a half-open probe
    pub recovery_timeout_secs: u64,

    /// Probe response time above this raises a slow-response alert (ms)
    pub slow_response_ms: u64,

    /// Window within which duplicate alerts are suppressed (seconds)
    pub alert_dedup_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            failure_threshold: 5,
            recovery_timeout_secs: 600,
            slow_response_ms: 5000,
            alert_dedup_secs: 300,
        }
    }
}

impl HealthConfig {
    /// Probe sweep interval as a Duration
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Recovery timeout as a Duration
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    /// Alert dedup window as a Duration
    pub fn alert_dedup(&self) -> Duration {
        Duration::from_secs(self.alert_dedup_secs)
    }
}
