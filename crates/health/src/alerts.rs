//! Alerting with storm suppression
//!
//! Alerts are raised on status transitions and slow responses, and
//! deduplicated per (connector, kind) within a configurable window.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Connector transitioned into degraded
    Degraded,
    /// Connector transitioned into down
    Down,
    /// Probe succeeded but took longer than the slow threshold
    SlowResponse,
    /// The circuit breaker opened
    CircuitOpened,
}

/// How urgent the alert is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// One raised alert
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Alert id
    pub id: String,
    /// Connector the alert concerns
    pub connector_id: String,
    /// What triggered it
    pub kind: AlertKind,
    /// Urgency
    pub severity: AlertSeverity,
    /// Human-readable detail
    pub message: String,
    /// When it was raised
    pub triggered_at: DateTime<Utc>,
    /// When the condition cleared
    pub resolved_at: Option<DateTime<Utc>>,
    /// Operator acknowledgement
    pub acknowledged: bool,
}

static ALERT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Raises, deduplicates, and resolves alerts
pub struct AlertManager {
    dedup_window: Duration,
    last_raised: Mutex<HashMap<(String, AlertKind), DateTime<Utc>>>,
    active: Mutex<Vec<Alert>>,
}

impl AlertManager {
    /// Create a manager with the given dedup window
    pub fn new(dedup_window: std::time::Duration) -> Self {
        Self {
            dedup_window: Duration::from_std(dedup_window)
                .unwrap_or_else(|_| Duration::seconds(300)),
            last_raised: Mutex::new(HashMap::new()),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Raise an alert unless an identical one fired inside the window
    ///
    /// Returns the alert when raised, `None` when deduplicated.
    pub fn raise(
        &self,
        connector_id: &str,
        kind: AlertKind,
        severity: AlertSeverity,
        message: impl Into<String>,
    ) -> Option<Alert> {
        let now = Utc::now();
        let key = (connector_id.to_string(), kind);

        {
            let mut last = self.last_raised.lock();
            if let Some(previous) = last.get(&key) {
                if now - *previous < self.dedup_window {
                    return None;
                }
            }
            last.insert(key, now);
        }

        let alert = Alert {
            id: format!("alert-{:06}", ALERT_SEQ.fetch_add(1, Ordering::Relaxed)),
            connector_id: connector_id.to_string(),
            kind,
            severity,
            message: message.into(),
            triggered_at: now,
            resolved_at: None,
            acknowledged: false,
        };

        warn!(
            alert = %alert.id,
            connector = %alert.connector_id,
            kind = ?alert.kind,
            severity = ?alert.severity,
            message = %alert.message,
            "alert raised"
        );

        self.active.lock().push(alert.clone());
        Some(alert)
    }

    /// Resolve all active alerts for a connector
    ///
    /// Called when the connector probes healthy again.
    pub fn resolve_for(&self, connector_id: &str) -> usize {
        let now = Utc::now();
        let mut active = self.active.lock();
        let mut resolved = 0;
        for alert in active.iter_mut() {
            if alert.connector_id == connector_id && alert.resolved_at.is_none() {
                alert.resolved_at = Some(now);
                resolved += 1;
            }
        }
        resolved
    }

    /// Acknowledge an alert by id
    pub fn acknowledge(&self, alert_id: &str) -> bool {
        let mut active = self.active.lock();
        for alert in active.iter_mut() {
            if alert.id == alert_id {
                alert.acknowledged = true;
                return true;
            }
        }
        false
    }

    /// Alerts that have not yet resolved
    pub fn unresolved(&self) -> Vec<Alert> {
        self.active
            .lock()
            .iter()
            .filter(|a| a.resolved_at.is_none())
            .cloned()
            .collect()
    }

    /// Everything the manager has raised, resolved included
    pub fn all(&self) -> Vec<Alert> {
        self.active.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(window_secs: u64) -> AlertManager {
        AlertManager::new(std::time::Duration::from_secs(window_secs))
    }

    #[test]
    fn test_duplicate_alert_suppressed_within_window() {
        let alerts = manager(300);
        assert!(alerts
            .raise("grc", AlertKind::Down, AlertSeverity::Critical, "down")
            .is_some());
        assert!(alerts
            .raise("grc", AlertKind::Down, AlertSeverity::Critical, "down")
            .is_none());
        assert_eq!(alerts.unresolved().len(), 1);
    }

    #[test]
    fn test_different_kinds_are_not_deduped() {
        let alerts = manager(300);
        assert!(alerts
            .raise("grc", AlertKind::Down, AlertSeverity::Critical, "down")
            .is_some());
        assert!(alerts
            .raise("grc", AlertKind::SlowResponse, AlertSeverity::Warning, "slow")
            .is_some());
    }

    #[test]
    fn test_zero_window_never_dedupes() {
        let alerts = manager(0);
        assert!(alerts
            .raise("grc", AlertKind::Down, AlertSeverity::Critical, "down")
            .is_some());
        assert!(alerts
            .raise("grc", AlertKind::Down, AlertSeverity::Critical, "down")
            .is_some());
    }

    #[test]
    fn test_resolve_and_acknowledge() {
        let alerts = manager(300);
        let alert = alerts
            .raise("grc", AlertKind::Degraded, AlertSeverity::Warning, "degraded")
            .unwrap();

        assert!(alerts.acknowledge(&alert.id));
        assert_eq!(alerts.resolve_for("grc"), 1);
        assert!(alerts.unresolved().is_empty());
        assert!(alerts.all()[0].resolved_at.is_some());
    }
}
