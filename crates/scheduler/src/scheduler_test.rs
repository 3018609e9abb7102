//! Tests for scheduling, overlap protection, and circuit gating

use super::*;
use async_trait::async_trait;
use filer_health::{HttpProber, ProbeClient};
use filer_pipeline::{MemoryAuditLog, RunOutcome};
use filer_record::Record;
use filer_report::InstanceStatus;
use std::sync::atomic::AtomicU32;

struct StubRunner {
    runs: AtomicU32,
    delay: Duration,
}

impl StubRunner {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicU32::new(0),
            delay,
        })
    }

    fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunPipeline for StubRunner {
    async fn run(
        &self,
        _config_id: &str,
        _config: &ReportConfig,
        _cancel: CancellationToken,
    ) -> filer_pipeline::Result<RunOutcome> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(RunOutcome {
            instance_id: "rpt-test-0001".into(),
            status: InstanceStatus::Generated,
            submissions: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        })
    }
}

struct EmptyFetcher;

#[async_trait]
impl Fetcher for EmptyFetcher {
    async fn fetch(
        &self,
        _mapping: &MappingConfig,
        _period: &ReportingPeriod,
    ) -> filer_connectors::Result<Vec<Record>> {
        Ok(Vec::new())
    }
}

const CONFIG: &str = r#"
[connectors.kri_logs]
system = "GRC metric store"
source_type = "core_banking"
endpoint = "https://grc.internal/api/kri"

[reports.ops_m]
name = "Monthly ops report"
template_id = "ops-m"
frequency = "monthly"

[[reports.ops_m.mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"
"#;

struct Harness {
    scheduler: Scheduler,
    runner: Arc<StubRunner>,
    monitor: Arc<HealthMonitor>,
    audit: Arc<MemoryAuditLog>,
}

fn harness(runner_delay: Duration) -> Harness {
    let config: Config = CONFIG.parse().unwrap();
    let registry = Arc::new(ConnectorRegistry::from_config(&config.connectors));
    let prober = Arc::new(HttpProber::new(Duration::from_secs(1)).unwrap());
    let monitor = Arc::new(HealthMonitor::new(
        Arc::clone(&registry),
        prober as Arc<dyn ProbeClient>,
        config.health.clone(),
    ));
    let runner = StubRunner::new(runner_delay);
    let audit = Arc::new(MemoryAuditLog::new());

    let scheduler = Scheduler::from_config(
        &config,
        Arc::clone(&runner) as Arc<dyn RunPipeline>,
        Arc::clone(&monitor),
        Arc::new(EmptyFetcher),
        registry,
        Arc::clone(&audit) as Arc<dyn AuditLog>,
    )
    .unwrap();

    Harness {
        scheduler,
        runner,
        monitor,
        audit,
    }
}

fn force_due(scheduler: &mut Scheduler, now: DateTime<Utc>) {
    for report in &mut scheduler.reports {
        report.next_run = Some(now - ChronoDuration::seconds(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_tick_is_skipped() {
    let mut harness = harness(Duration::from_secs(3600));
    let cancel = CancellationToken::new();
    let now = Utc::now();

    // First tick dispatches the run
    force_due(&mut harness.scheduler, now);
    assert_eq!(harness.scheduler.tick(now, &cancel), 1);

    // One second later the run is still in flight: skipped, not overlapped
    let later = now + ChronoDuration::seconds(1);
    force_due(&mut harness.scheduler, later);
    assert_eq!(harness.scheduler.tick(later, &cancel), 0);

    // Let the spawned task start; exactly one run ever began
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.runner.runs(), 1);

    let skips: Vec<_> = harness
        .audit
        .events_of(AuditEventKind::Schedule)
        .into_iter()
        .filter(|e| e.status == AuditStatus::Warning)
        .collect();
    assert_eq!(skips.len(), 1);
    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_runs_again_after_completion() {
    let mut harness = harness(Duration::from_millis(1));
    let cancel = CancellationToken::new();
    let now = Utc::now();

    force_due(&mut harness.scheduler, now);
    assert_eq!(harness.scheduler.tick(now, &cancel), 1);

    // Let the run finish
    tokio::time::sleep(Duration::from_millis(50)).await;

    let later = now + ChronoDuration::seconds(60);
    force_due(&mut harness.scheduler, later);
    assert_eq!(harness.scheduler.tick(later, &cancel), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.runner.runs(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_blocks_dependent_report() {
    let mut harness = harness(Duration::from_millis(1));
    let cancel = CancellationToken::new();
    let now = Utc::now();

    // Trip the breaker for the report's only connector
    let breaker = harness.monitor.breaker("kri_logs").unwrap();
    for _ in 0..5 {
        breaker.record_failure();
    }
    assert!(harness.monitor.is_open("kri_logs"));

    force_due(&mut harness.scheduler, now);
    assert_eq!(harness.scheduler.tick(now, &cancel), 0);
    assert_eq!(harness.runner.runs(), 0);

    // The skip is audited against the connector, not raised as an error
    let skips = harness.audit.events_of(AuditEventKind::Schedule);
    assert_eq!(skips.len(), 1);
    assert_eq!(skips[0].connector_id.as_deref(), Some("kri_logs"));
}

#[tokio::test]
async fn test_tick_advances_schedule() {
    let mut harness = harness(Duration::from_millis(1));
    let cancel = CancellationToken::new();
    let now = Utc::now();

    force_due(&mut harness.scheduler, now);
    harness.scheduler.tick(now, &cancel);

    let next = harness.scheduler.reports[0].next_run().unwrap();
    assert!(next > now);
}

#[tokio::test(start_paused = true)]
async fn test_worker_limit_defers_excess_runs() {
    let toml = format!(
        "{}\n{}",
        "[global]\nmax_concurrent_runs = 1\n",
        CONFIG.replace(
            "[reports.ops_m]",
            "[reports.ops_w]\nname = \"Weekly\"\ntemplate_id = \"w\"\nfrequency = \"weekly\"\n\n[reports.ops_m]"
        )
    );
    let config: Config = toml.parse().unwrap();
    let registry = Arc::new(ConnectorRegistry::from_config(&config.connectors));
    let prober = Arc::new(HttpProber::new(Duration::from_secs(1)).unwrap());
    let monitor = Arc::new(HealthMonitor::new(
        Arc::clone(&registry),
        prober as Arc<dyn ProbeClient>,
        config.health.clone(),
    ));
    let runner = StubRunner::new(Duration::from_secs(3600));

    let mut scheduler = Scheduler::from_config(
        &config,
        Arc::clone(&runner) as Arc<dyn RunPipeline>,
        monitor,
        Arc::new(EmptyFetcher),
        registry,
        Arc::new(MemoryAuditLog::new()) as Arc<dyn AuditLog>,
    )
    .unwrap();
    assert_eq!(scheduler.report_count(), 2);

    let cancel = CancellationToken::new();
    let now = Utc::now();
    force_due(&mut scheduler, now);

    // Only one run fits the pool; the other stays due for the next tick
    assert_eq!(scheduler.tick(now, &cancel), 1);
    let still_due = scheduler
        .reports
        .iter()
        .filter(|r| r.should_run(now + ChronoDuration::seconds(1)))
        .count();
    assert_eq!(still_due, 1);
    cancel.cancel();
}

#[test]
fn test_invalid_schedule_is_rejected() {
    let config: ReportConfig = toml::from_str(
        r#"
name = "Bad"
template_id = "t"
frequency = "daily"
schedule = "not a cron"
"#,
    )
    .unwrap();

    assert!(matches!(
        ScheduledReport::new("bad", config),
        Err(SchedulerError::InvalidSchedule { .. })
    ));
}

#[test]
fn test_disabled_reports_are_not_scheduled() {
    let toml = format!(
        "{}\n{}",
        CONFIG,
        r#"
[reports.disabled_r]
name = "Disabled"
template_id = "t"
frequency = "daily"
enabled = false
"#
    );
    let config: Config = toml.parse().unwrap();
    let registry = Arc::new(ConnectorRegistry::from_config(&config.connectors));
    let prober = Arc::new(HttpProber::new(Duration::from_secs(1)).unwrap());
    let monitor = Arc::new(HealthMonitor::new(
        Arc::clone(&registry),
        prober as Arc<dyn ProbeClient>,
        config.health.clone(),
    ));

    let scheduler = Scheduler::from_config(
        &config,
        StubRunner::new(Duration::from_millis(1)) as Arc<dyn RunPipeline>,
        monitor,
        Arc::new(EmptyFetcher),
        registry,
        Arc::new(MemoryAuditLog::new()) as Arc<dyn AuditLog>,
    )
    .unwrap();

    assert_eq!(scheduler.report_count(), 1);
}
