//! Tests for the pipeline runner

use super::*;
use crate::notify::LogNotifier;
use crate::MemoryAuditLog;
use async_trait::async_trait;
use filer_config::{MappingConfig, SubmissionTarget};
use filer_connectors::{ConnectorError, Fetcher};
use filer_quality::NoLookup;
use filer_record::{Record, ReportingPeriod};
use filer_report::MemoryStore;
use filer_submit::{DeliveryClient, DeliveryReceipt, SubmitError};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};

struct StubFetcher;

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        mapping: &MappingConfig,
        period: &ReportingPeriod,
    ) -> filer_connectors::Result<Vec<Record>> {
        match mapping.source_id.as_str() {
            "kri_logs" => Ok((0..5)
                .map(|i| {
                    let mut r = Record::new(period.start);
                    r.set("value", json!(i));
                    r
                })
                .collect()),
            "missing_field" => Ok(vec![Record::new(period.start)]),
            _ => Err(ConnectorError::SourceUnavailable {
                connector: mapping.source_id.clone(),
                message: "connection refused".into(),
            }),
        }
    }
}

struct CountingClient {
    calls: AtomicU32,
    accept: bool,
}

impl CountingClient {
    fn accepting() -> Arc<Self> {
        Arc::new(Self { calls: AtomicU32::new(0), accept: true })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self { calls: AtomicU32::new(0), accept: false })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryClient for CountingClient {
    async fn deliver(
        &self,
        target: &SubmissionTarget,
        _instance_id: &str,
        _payload: &[u8],
    ) -> filer_submit::Result<DeliveryReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            Ok(DeliveryReceipt {
                external_reference: Some("REF-1".into()),
                message: "accepted".into(),
            })
        } else {
            Err(SubmitError::Rejected {
                target: target.target.as_str().into(),
                message: "bad payload".into(),
            })
        }
    }
}

struct Harness {
    runner: PipelineRunner,
    store: Arc<MemoryStore>,
    audit: Arc<MemoryAuditLog>,
    client: Arc<CountingClient>,
}

fn harness(client: Arc<CountingClient>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let runner = PipelineRunner::new(
        Aggregator::new(Arc::new(StubFetcher), Arc::new(NoLookup)),
        SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>),
        Arc::clone(&store) as Arc<dyn ReportStore>,
        Arc::clone(&audit) as Arc<dyn AuditLog>,
        Arc::new(LogNotifier),
    );
    Harness { runner, store, audit, client }
}

fn config(toml: &str) -> ReportConfig {
    toml::from_str(toml).unwrap()
}

const BASE: &str = r#"
name = "Monthly ops report"
template_id = "ops-m"
frequency = "monthly"

[[mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"
"#;

// Same as BASE but with `auto_submit` set at the report root. It must
// precede the `[[mappings]]` table header, otherwise TOML would attach the
// key to the mapping instead of the report.
const BASE_AUTO: &str = r#"
name = "Monthly ops report"
template_id = "ops-m"
frequency = "monthly"
auto_submit = true

[[mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"
"#;

#[tokio::test]
async fn test_full_run_submits_and_persists() {
    let harness = harness(CountingClient::accepting());
    let config = config(&format!(
        "{}{}",
        BASE_AUTO,
        r#"
[submission]
enabled = true

[[submission.targets]]
target = "api_endpoint"
format = "json"
endpoint = "https://authority.example/submit"
"#
    ));

    let outcome = harness
        .runner
        .run("ops_m", &config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, InstanceStatus::Submitted);
    assert_eq!(outcome.submissions.len(), 1);
    assert_eq!(harness.client.calls(), 1);

    let stored = harness.store.get(&outcome.instance_id).await.unwrap();
    assert_eq!(stored.status, InstanceStatus::Submitted);

    // The audit trail has the whole story
    assert!(!harness.audit.events_of(AuditEventKind::Fetch).is_empty());
    assert!(!harness.audit.events_of(AuditEventKind::Validate).is_empty());
    assert!(!harness.audit.events_of(AuditEventKind::Generate).is_empty());
    assert!(!harness.audit.events_of(AuditEventKind::Submit).is_empty());
}

#[tokio::test]
async fn test_blocked_report_suppresses_auto_submit() {
    let harness = harness(CountingClient::accepting());
    let config = config(
        r#"
name = "Monthly ops report"
template_id = "ops-m"
frequency = "monthly"
auto_submit = true

[[mappings]]
source_type = "core_banking"
source_id = "missing_field"
target_field = "kri"

[[mappings.checks]]
id = "value-present"
name = "Value present"
check = "completeness"
field = "value"
severity = "error"
message = "value missing"

[submission]
enabled = true

[[submission.targets]]
target = "api_endpoint"
format = "json"
endpoint = "https://authority.example/submit"
"#,
    );

    let outcome = harness
        .runner
        .run("ops_m", &config, CancellationToken::new())
        .await
        .unwrap();

    // Blocked: review status, no external call even with auto_submit on
    assert_eq!(outcome.status, InstanceStatus::Review);
    assert!(outcome.submissions.is_empty());
    assert_eq!(harness.client.calls(), 0);
}

#[tokio::test]
async fn test_required_source_failure_leaves_error_instance() {
    let harness = harness(CountingClient::accepting());
    let config = config(
        r#"
name = "Monthly ops report"
template_id = "ops-m"
frequency = "monthly"

[[mappings]]
source_type = "incident"
source_id = "down"
target_field = "incidents"
required = true
"#,
    );

    let outcome = harness
        .runner
        .run("ops_m", &config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, InstanceStatus::Error);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("down"));

    let stored = harness.store.get(&outcome.instance_id).await.unwrap();
    assert_eq!(stored.status, InstanceStatus::Error);
    assert!(!stored.errors.is_empty());
}

#[tokio::test]
async fn test_without_auto_submit_run_stops_at_generated() {
    let harness = harness(CountingClient::accepting());
    let outcome = harness
        .runner
        .run("ops_m", &config(BASE), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, InstanceStatus::Generated);
    assert_eq!(harness.client.calls(), 0);
}

#[tokio::test]
async fn test_failed_submission_surfaces_as_error() {
    let harness = harness(CountingClient::rejecting());
    let config = config(&format!(
        "{}{}",
        BASE_AUTO,
        r#"
[submission]
enabled = true

[[submission.targets]]
target = "osfi_portal"
format = "xml"
endpoint = "https://rrs.osfi.example/submit"
"#
    ));

    let outcome = harness
        .runner
        .run("ops_m", &config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, InstanceStatus::Error);
    assert!(outcome.errors.iter().any(|e| e.contains("bad payload")));

    let stored = harness.store.get(&outcome.instance_id).await.unwrap();
    assert_eq!(stored.status, InstanceStatus::Error);
}

#[tokio::test]
async fn test_pending_confirmation_keeps_generated() {
    let harness = harness(CountingClient::accepting());
    let config = config(&format!(
        "{}{}",
        BASE_AUTO,
        r#"
[submission]
enabled = true

[[submission.targets]]
target = "osfi_portal"
format = "xml"
endpoint = "https://rrs.osfi.example/submit"
requires_confirmation = true
"#
    ));

    let outcome = harness
        .runner
        .run("ops_m", &config, CancellationToken::new())
        .await
        .unwrap();

    // Delivered but unconfirmed: not submitted yet
    assert_eq!(outcome.status, InstanceStatus::Generated);
    assert_eq!(
        outcome.submissions[0].status,
        filer_submit::SubmissionStatus::Pending
    );
}

#[tokio::test]
async fn test_cancelled_run_leaves_no_instance() {
    let harness = harness(CountingClient::accepting());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .runner
        .run("ops_m", &config(BASE), cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled));
    assert!(harness
        .store
        .list_for_config("ops_m")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(harness.client.calls(), 0);
}
