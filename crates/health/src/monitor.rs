//! The health monitor
//!
//! Periodically probes every connector, drives the per-connector circuit
//! breakers, flips connector status in the registry, and raises alerts.
//! Probing is independent of pipeline runs and fully parallel across
//! connectors.

use crate::alerts::{AlertKind, AlertManager, AlertSeverity};
use crate::breaker::{BreakerState, CircuitBreaker};
use crate::probe::{HealthCheck, HealthStatus, ProbeClient};
use crate::{HealthError, Result};
use filer_config::HealthConfig;
use filer_connectors::{
    AuditEvent, AuditEventKind, AuditLog, AuditStatus, ConnectorRegistry, ConnectorStatus,
};
use serde_json::json;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Monitors connector health on an interval
pub struct HealthMonitor {
    registry: Arc<ConnectorRegistry>,
    prober: Arc<dyn ProbeClient>,
    config: HealthConfig,
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    alerts: Arc<AlertManager>,
    audit: Option<Arc<dyn AuditLog>>,
    last_status: Mutex<HashMap<String, HealthStatus>>,
}

impl HealthMonitor {
    /// Create a monitor over the registry
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        prober: Arc<dyn ProbeClient>,
        config: HealthConfig,
    ) -> Self {
        let breakers = registry
            .ids()
            .into_iter()
            .map(|id| {
                let breaker = Arc::new(CircuitBreaker::new(
                    id.clone(),
                    config.failure_threshold,
                    config.recovery_timeout(),
                ));
                (id, breaker)
            })
            .collect();

        let alerts = Arc::new(AlertManager::new(config.alert_dedup()));

        Self {
            registry,
            prober,
            config,
            breakers,
            alerts,
            audit: None,
            last_status: Mutex::new(HashMap::new()),
        }
    }

    /// Record every health check in the integration audit log
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The alert manager
    pub fn alerts(&self) -> Arc<AlertManager> {
        Arc::clone(&self.alerts)
    }

    /// The breaker for one connector
    pub fn breaker(&self, connector_id: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(connector_id).cloned()
    }

    /// Whether the scheduler must skip work for this connector
    pub fn is_open(&self, connector_id: &str) -> bool {
        self.breakers
            .get(connector_id)
            .is_some_and(|b| b.state() == BreakerState::Open)
    }

    /// Probe one connector and apply the outcome
    pub async fn check_connector(&self, connector_id: &str) -> Result<HealthCheck> {
        let handle = self
            .registry
            .get(connector_id)
            .map_err(|_| HealthError::UnknownConnector(connector_id.to_string()))?;
        let config = handle.read().config.clone();

        let outcome = self.prober.probe(connector_id, &config).await;
        let check = HealthCheck::from_outcome(connector_id, outcome);

        self.apply(&check);
        Ok(check)
    }

    fn apply(&self, check: &HealthCheck) {
        let id = check.connector_id.as_str();
        let previous = self.last_status.lock().insert(id.to_string(), check.status);
        let transitioned = previous != Some(check.status);

        match check.status {
            HealthStatus::Healthy => {
                if let Some(breaker) = self.breakers.get(id) {
                    breaker.record_success();
                }
                // The only place the consecutive error count resets
                let _ = self.registry.reset_errors(id);
                let _ = self.registry.set_status(id, ConnectorStatus::Active);
                if self.alerts.resolve_for(id) > 0 {
                    info!(connector = %id, "connector recovered");
                }
            }
            HealthStatus::Degraded => {
                // Reachable and authenticated; the breaker stays closed
                if transitioned {
                    self.alerts.raise(
                        id,
                        AlertKind::Degraded,
                        AlertSeverity::Warning,
                        "connector degraded: no data flowing",
                    );
                }
            }
            HealthStatus::Down => {
                let _ = self.registry.record_failure(id);
                let _ = self.registry.set_status(id, ConnectorStatus::Error);
                if transitioned {
                    self.alerts.raise(
                        id,
                        AlertKind::Down,
                        AlertSeverity::Critical,
                        "connector down",
                    );
                }
                if let Some(breaker) = self.breakers.get(id) {
                    if breaker.record_failure() {
                        self.alerts.raise(
                            id,
                            AlertKind::CircuitOpened,
                            AlertSeverity::Critical,
                            "circuit breaker opened",
                        );
                    }
                }
            }
        }

        if check.response_time_ms > self.config.slow_response_ms {
            self.alerts.raise(
                id,
                AlertKind::SlowResponse,
                AlertSeverity::Warning,
                format!("probe took {} ms", check.response_time_ms),
            );
        }

        if let Some(audit) = &self.audit {
            let audit_status = match check.status {
                HealthStatus::Healthy => AuditStatus::Success,
                HealthStatus::Degraded => AuditStatus::Warning,
                HealthStatus::Down => AuditStatus::Error,
            };
            audit.append(
                AuditEvent::new(AuditEventKind::HealthCheck, audit_status)
                    .connector(id)
                    .response_time(check.response_time_ms)
                    .detail(json!({
                        "connectivity": check.connectivity,
                        "authentication": check.authentication,
                        "data_flow": check.data_flow,
                    })),
            );
        }

        debug!(
            connector = %id,
            status = ?check.status,
            response_ms = check.response_time_ms,
            "health check applied"
        );
    }

    /// Probe every connector in parallel
    pub async fn sweep(self: &Arc<Self>) -> Vec<HealthCheck> {
        let mut tasks = JoinSet::new();
        for id in self.registry.ids() {
            let monitor = Arc::clone(self);
            tasks.spawn(async move { monitor.check_connector(&id).await });
        }

        let mut checks = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(check)) => checks.push(check),
                Ok(Err(e)) => warn!(error = %e, "health check failed"),
                Err(e) => warn!(error = %e, "health check task panicked"),
            }
        }
        checks.sort_by(|a, b| a.connector_id.cmp(&b.connector_id));
        checks
    }

    /// Run the probe loop until cancelled
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            connectors = self.registry.len(),
            interval_secs = self.config.check_interval_secs,
            "health monitor started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("health monitor stopping");
                    break;
                }
                _ = interval.tick() => {
                    let checks = self.sweep().await;
                    debug!(probed = checks.len(), "health sweep complete");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "monitor_test.rs"]
mod tests;
