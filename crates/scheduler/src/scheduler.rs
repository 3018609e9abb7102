//! The scheduler loop
//!
//! Each report and each scheduled connector sync runs in its own spawned
//! task for isolation; the loop only checks due times and guards.

use crate::{Result, SchedulerError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cron::Schedule;
use filer_config::{Config, MappingConfig, ReportConfig, SyncFrequency};
use filer_connectors::{ConnectorRegistry, Fetcher};
use filer_health::HealthMonitor;
use filer_pipeline::{AuditEvent, AuditEventKind, AuditLog, AuditStatus, RunPipeline};
use filer_record::ReportingPeriod;
use serde_json::json;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default interval between scheduler checks
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// One report configuration under schedule
pub struct ScheduledReport {
    /// Report config id
    pub config_id: String,
    config: ReportConfig,
    schedule: Schedule,
    next_run: Option<DateTime<Utc>>,
    running: Arc<AtomicBool>,
}

impl ScheduledReport {
    /// Build from a report config, parsing its effective schedule
    pub fn new(config_id: impl Into<String>, config: ReportConfig) -> Result<Self> {
        let config_id = config_id.into();
        let expr = config.effective_schedule().to_string();
        let schedule =
            Schedule::from_str(&expr).map_err(|e| SchedulerError::InvalidSchedule {
                name: config_id.clone(),
                schedule: expr,
                message: e.to_string(),
            })?;
        let next_run = schedule.upcoming(Utc).next();

        Ok(Self {
            config_id,
            config,
            schedule,
            next_run,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Next scheduled run time
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_run, Some(next) if now >= next)
    }

    fn advance_schedule(&mut self) {
        self.next_run = self.schedule.upcoming(Utc).next();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
    }
}

/// One connector sync under schedule
struct ScheduledSync {
    connector_id: String,
    mapping: MappingConfig,
    /// None means real-time: due on every check
    schedule: Option<Schedule>,
    next_run: Option<DateTime<Utc>>,
    running: Arc<AtomicBool>,
}

impl ScheduledSync {
    fn should_run(&self, now: DateTime<Utc>) -> bool {
        match &self.schedule {
            None => true,
            Some(_) => matches!(self.next_run, Some(next) if now >= next),
        }
    }

    fn advance_schedule(&mut self) {
        if let Some(schedule) = &self.schedule {
            self.next_run = schedule.upcoming(Utc).next();
        }
    }
}

/// Drives report runs and connector syncs on their schedules
pub struct Scheduler {
    reports: Vec<ScheduledReport>,
    syncs: Vec<ScheduledSync>,
    runner: Arc<dyn RunPipeline>,
    monitor: Arc<HealthMonitor>,
    fetcher: Arc<dyn Fetcher>,
    registry: Arc<ConnectorRegistry>,
    audit: Arc<dyn AuditLog>,
    check_interval: Duration,
    max_concurrent_runs: usize,
}

impl Scheduler {
    /// Build the scheduler from configuration
    ///
    /// Enabled reports tick on their effective schedules; connectors with
    /// a scheduled or real-time sync cadence tick independently.
    pub fn from_config(
        config: &Config,
        runner: Arc<dyn RunPipeline>,
        monitor: Arc<HealthMonitor>,
        fetcher: Arc<dyn Fetcher>,
        registry: Arc<ConnectorRegistry>,
        audit: Arc<dyn AuditLog>,
    ) -> Result<Self> {
        let mut reports = Vec::new();
        for (id, report_config) in config.reports.enabled() {
            let scheduled = ScheduledReport::new(id.clone(), report_config.clone())?;
            info!(
                report = %id,
                schedule = %report_config.effective_schedule(),
                next_run = ?scheduled.next_run(),
                "registered report"
            );
            reports.push(scheduled);
        }

        let mut syncs = Vec::new();
        for (id, connector) in config.connectors.iter() {
            let schedule = match &connector.sync {
                SyncFrequency::Manual => continue,
                SyncFrequency::RealTime => None,
                SyncFrequency::Scheduled { schedule } => Some(
                    Schedule::from_str(schedule).map_err(|e| {
                        SchedulerError::InvalidSchedule {
                            name: id.clone(),
                            schedule: schedule.clone(),
                            message: e.to_string(),
                        }
                    })?,
                ),
            };
            let next_run = schedule.as_ref().and_then(|s| s.upcoming(Utc).next());
            let _ = registry.set_next_sync(id, next_run);

            syncs.push(ScheduledSync {
                connector_id: id.clone(),
                mapping: MappingConfig {
                    source_type: connector.source_type,
                    source_id: id.clone(),
                    target_field: "sync".to_string(),
                    required: false,
                    transforms: Vec::new(),
                    checks: Vec::new(),
                },
                schedule,
                next_run,
                running: Arc::new(AtomicBool::new(false)),
            });
        }

        Ok(Self {
            reports,
            syncs,
            runner,
            monitor,
            fetcher,
            registry,
            audit,
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            max_concurrent_runs: config.global.max_concurrent_runs.max(1),
        })
    }

    /// Set the interval between scheduler checks
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Number of scheduled reports
    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// First mapping whose connector circuit is open, if any
    fn blocked_by(monitor: &HealthMonitor, config: &ReportConfig) -> Option<String> {
        config
            .mappings
            .iter()
            .find(|m| monitor.is_open(&m.source_id))
            .map(|m| m.source_id.clone())
    }

    /// Check due reports and syncs, spawning tasks for each
    ///
    /// Returns how many report runs were dispatched.
    fn tick(&mut self, now: DateTime<Utc>, cancel: &CancellationToken) -> usize {
        let mut dispatched = 0;
        let mut in_flight = self.reports.iter().filter(|r| r.is_running()).count();

        for report in &mut self.reports {
            if !report.should_run(now) {
                continue;
            }

            // One in-flight run per config: an overdue tick is skipped
            // with a warning, never overlapped
            if report.is_running() {
                warn!(
                    report = %report.config_id,
                    "skipping scheduled run - previous execution still in progress"
                );
                self.audit.append(
                    AuditEvent::new(AuditEventKind::Schedule, AuditStatus::Warning)
                        .config(&report.config_id)
                        .error_message("previous execution still in progress"),
                );
                report.advance_schedule();
                continue;
            }

            // The worker pool is bounded; an over-limit report stays due
            // and is picked up on a later tick
            if in_flight >= self.max_concurrent_runs {
                warn!(
                    report = %report.config_id,
                    in_flight,
                    "worker limit reached, deferring run"
                );
                continue;
            }

            if let Some(connector) = Self::blocked_by(self.monitor.as_ref(), &report.config) {
                debug!(
                    report = %report.config_id,
                    connector = %connector,
                    "circuit open, report blocked this tick"
                );
                self.audit.append(
                    AuditEvent::new(AuditEventKind::Schedule, AuditStatus::Warning)
                        .config(&report.config_id)
                        .connector(&connector)
                        .error_message("circuit open, run skipped"),
                );
                report.advance_schedule();
                continue;
            }

            if !report.try_start() {
                continue;
            }

            info!(report = %report.config_id, "spawning scheduled pipeline run");
            dispatched += 1;
            in_flight += 1;

            let config_id = report.config_id.clone();
            let config = report.config.clone();
            let runner = Arc::clone(&self.runner);
            let running_flag = Arc::clone(&report.running);
            let run_cancel = cancel.child_token();

            tokio::spawn(async move {
                match runner.run(&config_id, &config, run_cancel).await {
                    Ok(outcome) => {
                        info!(
                            report = %config_id,
                            instance = %outcome.instance_id,
                            status = ?outcome.status,
                            "scheduled run complete"
                        );
                    }
                    Err(e) => {
                        error!(report = %config_id, error = %e, "scheduled run failed");
                    }
                }
                running_flag.store(false, Ordering::Relaxed);
            });

            report.advance_schedule();
        }

        for sync in &mut self.syncs {
            if !sync.should_run(now) {
                continue;
            }
            if sync.running.load(Ordering::Relaxed) {
                continue;
            }

            if self.monitor.is_open(&sync.connector_id) {
                debug!(connector = %sync.connector_id, "circuit open, sync skipped");
                sync.advance_schedule();
                let _ = self.registry.set_next_sync(&sync.connector_id, sync.next_run);
                continue;
            }

            if sync
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            let connector_id = sync.connector_id.clone();
            let mapping = sync.mapping.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let audit = Arc::clone(&self.audit);
            let running_flag = Arc::clone(&sync.running);

            // Freshness pull over the trailing day; records are discarded,
            // the connector's sync state and audit trail are the point
            let period = ReportingPeriod::new(now - ChronoDuration::days(1), now);

            tokio::spawn(async move {
                match fetcher.fetch(&mapping, &period).await {
                    Ok(records) => {
                        debug!(
                            connector = %connector_id,
                            records = records.len(),
                            "scheduled sync complete"
                        );
                        audit.append(
                            AuditEvent::new(AuditEventKind::Fetch, AuditStatus::Success)
                                .connector(&connector_id)
                                .detail(json!({"sync": true, "records": records.len()})),
                        );
                    }
                    Err(e) => {
                        warn!(connector = %connector_id, error = %e, "scheduled sync failed");
                        audit.append(
                            AuditEvent::new(AuditEventKind::Fetch, AuditStatus::Error)
                                .connector(&connector_id)
                                .error_message(e.to_string())
                                .detail(json!({"sync": true})),
                        );
                    }
                }
                running_flag.store(false, Ordering::Relaxed);
            });

            sync.advance_schedule();
            let _ = self.registry.set_next_sync(&sync.connector_id, sync.next_run);
        }

        dispatched
    }

    /// Run the scheduler loop until cancelled
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            reports = self.reports.len(),
            syncs = self.syncs.len(),
            check_interval = ?self.check_interval,
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(self.check_interval) => {
                    self.tick(Utc::now(), &cancel);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
