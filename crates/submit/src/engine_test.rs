//! Tests for the submission engine

use super::*;
use crate::delivery::{DeliveryClient, DeliveryReceipt};
use async_trait::async_trait;
use filer_record::ReportingPeriod;
use parking_lot::Mutex;
use std::sync::atomic::AtomicU32;

/// Scripted delivery client: pops one behavior per call
struct ScriptedClient {
    calls: AtomicU32,
    script: Mutex<Vec<Outcome>>,
}

enum Outcome {
    Accept(Option<String>),
    Transient,
    Reject,
}

impl ScriptedClient {
    fn new(script: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            script: Mutex::new(script),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryClient for ScriptedClient {
    async fn deliver(
        &self,
        target: &SubmissionTarget,
        _instance_id: &str,
        _payload: &[u8],
    ) -> crate::Result<DeliveryReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock();
            if script.is_empty() {
                Outcome::Accept(None)
            } else {
                script.remove(0)
            }
        };
        match next {
            Outcome::Accept(reference) => Ok(DeliveryReceipt {
                external_reference: reference,
                message: "accepted with 200 OK".into(),
            }),
            Outcome::Transient => Err(SubmitError::Transient {
                target: target.target.as_str().into(),
                message: "gateway timeout".into(),
            }),
            Outcome::Reject => Err(SubmitError::Rejected {
                target: target.target.as_str().into(),
                message: "invalid credentials".into(),
            }),
        }
    }
}

fn instance(status: InstanceStatus) -> ReportInstance {
    let now = Utc::now();
    ReportInstance {
        id: "rpt-osfi-20240101-0001".into(),
        config_id: "osfi_q".into(),
        period: ReportingPeriod::new(
            "2024-01-01T00:00:00Z".parse().unwrap(),
            "2024-03-31T23:59:59Z".parse().unwrap(),
        ),
        due_date: "2024-04-30T00:00:00Z".parse().unwrap(),
        status,
        payload: serde_json::json!({"data": {}}),
        source_counts: Vec::new(),
        quality_score: 100.0,
        validation_results: Vec::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
        artifacts: Vec::new(),
        submissions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn submission_config(extra: &str) -> SubmissionConfig {
    let toml = format!(
        r#"
enabled = true

[[targets]]
target = "api_endpoint"
format = "json"
endpoint = "https://authority.example/submit"
{}

[targets.retry]
max_retries = 3
backoff = "exponential"
retry_interval_minutes = 1
"#,
        extra
    );
    toml::from_str(&toml).unwrap()
}

#[tokio::test]
async fn test_disabled_submission_is_a_noop() {
    let client = ScriptedClient::new(vec![]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let config: SubmissionConfig = toml::from_str("enabled = false").unwrap();
    let results = engine
        .submit(&instance(InstanceStatus::Generated), &config, false)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_already_submitted_makes_no_external_call() {
    let client = ScriptedClient::new(vec![]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let err = engine
        .submit(&instance(InstanceStatus::Submitted), &submission_config(""), false)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::AlreadySubmitted(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_force_overrides_idempotency() {
    let client = ScriptedClient::new(vec![Outcome::Accept(Some("REF-1".into()))]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let results = engine
        .submit(&instance(InstanceStatus::Submitted), &submission_config(""), true)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, SubmissionStatus::Success);
    assert_eq!(results[0].external_reference.as_deref(), Some("REF-1"));
    assert_eq!(client.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_third_attempt_with_two_retries() {
    // Fails twice then succeeds: success on the 3rd attempt, exactly 2
    // retries recorded
    let client = ScriptedClient::new(vec![
        Outcome::Transient,
        Outcome::Transient,
        Outcome::Accept(None),
    ]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let results = engine
        .submit(&instance(InstanceStatus::Generated), &submission_config(""), false)
        .await
        .unwrap();

    assert_eq!(results[0].status, SubmissionStatus::Success);
    assert_eq!(results[0].attempts, 3);
    assert_eq!(results[0].retries, 2);
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn test_rejection_is_never_retried() {
    let client = ScriptedClient::new(vec![Outcome::Reject]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let results = engine
        .submit(&instance(InstanceStatus::Generated), &submission_config(""), false)
        .await
        .unwrap();

    assert_eq!(results[0].status, SubmissionStatus::Failed);
    assert_eq!(results[0].attempts, 1);
    assert!(results[0].message.contains("invalid credentials"));
    assert_eq!(client.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_last_error() {
    let client = ScriptedClient::new(vec![
        Outcome::Transient,
        Outcome::Transient,
        Outcome::Transient,
        Outcome::Transient,
    ]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let results = engine
        .submit(&instance(InstanceStatus::Generated), &submission_config(""), false)
        .await
        .unwrap();

    assert_eq!(results[0].status, SubmissionStatus::Failed);
    assert_eq!(results[0].attempts, 4);
    assert!(results[0].message.contains("gateway timeout"));
    assert_eq!(client.calls(), 4);
}

#[tokio::test]
async fn test_confirmation_yields_pending_not_success() {
    let client = ScriptedClient::new(vec![Outcome::Accept(Some("OSFI-42".into()))]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let mut results = engine
        .submit(
            &instance(InstanceStatus::Generated),
            &submission_config("requires_confirmation = true"),
            false,
        )
        .await
        .unwrap();

    assert_eq!(results[0].status, SubmissionStatus::Pending);
    assert!(results[0].pending_deadline.is_some());

    // Confirmation settles it
    let now = Utc::now();
    resolve_confirmation(&mut results[0], true, now);
    assert_eq!(results[0].status, SubmissionStatus::Success);
    assert_eq!(results[0].confirmed_at, Some(now));
}

#[tokio::test]
async fn test_pending_expires_after_deadline() {
    let client = ScriptedClient::new(vec![Outcome::Accept(None)]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let mut results = engine
        .submit(
            &instance(InstanceStatus::Generated),
            &submission_config("requires_confirmation = true\nmax_pending_minutes = 60"),
            false,
        )
        .await
        .unwrap();

    // Within the window: nothing expires
    assert_eq!(expire_pending(&mut results, Utc::now()), 0);
    assert_eq!(results[0].status, SubmissionStatus::Pending);

    // Past the window: escalated to failed
    let later = Utc::now() + Duration::minutes(61);
    assert_eq!(expire_pending(&mut results, later), 1);
    assert_eq!(results[0].status, SubmissionStatus::Failed);
    assert!(results[0].message.contains("confirmation window"));
}

#[tokio::test]
async fn test_confirmation_rejection_fails() {
    let client = ScriptedClient::new(vec![Outcome::Accept(None)]);
    let engine = SubmissionEngine::new(Arc::clone(&client) as Arc<dyn DeliveryClient>);

    let mut results = engine
        .submit(
            &instance(InstanceStatus::Generated),
            &submission_config("requires_confirmation = true"),
            false,
        )
        .await
        .unwrap();

    resolve_confirmation(&mut results[0], false, Utc::now());
    assert_eq!(results[0].status, SubmissionStatus::Failed);
}
