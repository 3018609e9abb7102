//! The submission engine
//!
//! Applies idempotency, per-target rendering, retry policy, and
//! confirmation tracking around delivery calls.

use crate::delivery::DeliveryClient;
use crate::payload::render;
use crate::{Result, SubmitError};
use chrono::{DateTime, Duration, Utc};
use filer_config::{SubmissionConfig, SubmissionTarget};
use filer_report::{InstanceStatus, ReportInstance};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Final state of one submission attempt chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Accepted (and confirmed, where confirmation is required)
    Success,
    /// Rejected or retries exhausted
    Failed,
    /// Accepted but awaiting external confirmation
    Pending,
}

/// Append-only audit record of one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Submission id
    pub submission_id: String,
    /// Instance that was submitted
    pub instance_id: String,
    /// Target system (stable string form)
    pub target: String,
    /// Outcome
    pub status: SubmissionStatus,
    /// Reference assigned by the external system
    pub external_reference: Option<String>,
    /// Response or failure message
    pub message: String,
    /// When the last delivery attempt completed
    pub submitted_at: DateTime<Utc>,
    /// When external confirmation arrived
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Deadline after which a pending confirmation counts as failed
    pub pending_deadline: Option<DateTime<Utc>>,
    /// Delivery attempts made (initial try included)
    pub attempts: u32,
    /// Retries performed (attempts minus one, unless rejected early)
    pub retries: u32,
}

static SUBMISSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Delivers generated reports to configured targets
pub struct SubmissionEngine {
    client: Arc<dyn DeliveryClient>,
}

impl SubmissionEngine {
    /// Create an engine over the given delivery client
    pub fn new(client: Arc<dyn DeliveryClient>) -> Self {
        Self { client }
    }

    /// Submit an instance to every configured target
    ///
    /// Returns an empty list when submission is disabled. Fails with
    /// `AlreadySubmitted` (making no external call) when the instance is
    /// already submitted and `force` is not set. Per-target failures are
    /// captured in the results, never silently dropped.
    pub async fn submit(
        &self,
        instance: &ReportInstance,
        config: &SubmissionConfig,
        force: bool,
    ) -> Result<Vec<SubmissionResult>> {
        if !config.enabled {
            return Ok(Vec::new());
        }

        if instance.status == InstanceStatus::Submitted && !force {
            return Err(SubmitError::AlreadySubmitted(instance.id.clone()));
        }

        let mut results = Vec::with_capacity(config.targets.len());
        for target in &config.targets {
            results.push(self.submit_to_target(instance, target).await);
        }
        Ok(results)
    }

    async fn submit_to_target(
        &self,
        instance: &ReportInstance,
        target: &SubmissionTarget,
    ) -> SubmissionResult {
        let target_name = target.target.as_str().to_string();
        let submission_id = format!(
            "sub-{}-{}-{:04}",
            instance.id,
            target_name,
            SUBMISSION_SEQ.fetch_add(1, Ordering::Relaxed)
        );

        let payload = match render(instance, target.format) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(instance = %instance.id, target = %target_name, error = %e, "payload render failed");
                return SubmissionResult {
                    submission_id,
                    instance_id: instance.id.clone(),
                    target: target_name,
                    status: SubmissionStatus::Failed,
                    external_reference: None,
                    message: e.to_string(),
                    submitted_at: Utc::now(),
                    confirmed_at: None,
                    pending_deadline: None,
                    attempts: 0,
                    retries: 0,
                };
            }
        };

        let mut attempts = 0u32;
        let mut last_error: Option<SubmitError> = None;

        while attempts <= target.retry.max_retries {
            if attempts > 0 {
                let delay = target.retry.delay_for(attempts - 1);
                info!(
                    instance = %instance.id,
                    target = %target_name,
                    attempt = attempts,
                    delay_secs = delay.as_secs(),
                    "retrying submission after delay"
                );
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            match self.client.deliver(target, &instance.id, &payload).await {
                Ok(receipt) => {
                    let now = Utc::now();
                    let (status, deadline) = if target.requires_confirmation {
                        (
                            SubmissionStatus::Pending,
                            Some(now + Duration::minutes(target.max_pending_minutes as i64)),
                        )
                    } else {
                        (SubmissionStatus::Success, None)
                    };

                    info!(
                        instance = %instance.id,
                        target = %target_name,
                        attempts,
                        status = ?status,
                        "submission delivered"
                    );

                    return SubmissionResult {
                        submission_id,
                        instance_id: instance.id.clone(),
                        target: target_name,
                        status,
                        external_reference: receipt.external_reference,
                        message: receipt.message,
                        submitted_at: now,
                        confirmed_at: None,
                        pending_deadline: deadline,
                        attempts,
                        retries: attempts - 1,
                    };
                }
                Err(e) if e.is_transient() && attempts <= target.retry.max_retries => {
                    warn!(
                        instance = %instance.id,
                        target = %target_name,
                        attempt = attempts,
                        error = %e,
                        "transient submission failure, will retry"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    // Rejections stop immediately; transient errors land
                    // here only once retries are exhausted
                    warn!(
                        instance = %instance.id,
                        target = %target_name,
                        attempts,
                        error = %e,
                        "submission failed"
                    );
                    last_error = Some(e);
                    break;
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "submission failed".to_string());

        SubmissionResult {
            submission_id,
            instance_id: instance.id.clone(),
            target: target_name,
            status: SubmissionStatus::Failed,
            external_reference: None,
            message,
            submitted_at: Utc::now(),
            confirmed_at: None,
            pending_deadline: None,
            attempts,
            retries: attempts.saturating_sub(1),
        }
    }
}

/// Settle a pending submission from a confirmation callback or poll
///
/// Not conflated with delivery success: a pending result only becomes
/// `Success` here.
pub fn resolve_confirmation(
    result: &mut SubmissionResult,
    confirmed: bool,
    at: DateTime<Utc>,
) {
    if result.status != SubmissionStatus::Pending {
        return;
    }
    if confirmed {
        result.status = SubmissionStatus::Success;
        result.confirmed_at = Some(at);
    } else {
        result.status = SubmissionStatus::Failed;
        result.message = "confirmation rejected by target".to_string();
    }
}

/// Escalate pending submissions past their deadline to failed
///
/// Returns the number of results escalated.
pub fn expire_pending(results: &mut [SubmissionResult], now: DateTime<Utc>) -> usize {
    let mut expired = 0;
    for result in results {
        if result.status == SubmissionStatus::Pending
            && result.pending_deadline.is_some_and(|deadline| now > deadline)
        {
            result.status = SubmissionStatus::Failed;
            result.message = "confirmation window elapsed".to_string();
            expired += 1;
            warn!(
                submission = %result.submission_id,
                target = %result.target,
                "pending confirmation expired"
            );
        }
    }
    expired
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
