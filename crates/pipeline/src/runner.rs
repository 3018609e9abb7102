//! The pipeline runner
//!
//! Executes one run of a report configuration: aggregate, generate,
//! persist, submit. Cancellation is honored at every stage boundary; a
//! cancelled run discards its partial state and is never marked
//! submitted.

use crate::notify::{notify_outcome, Notifier};
use crate::{AuditEvent, AuditEventKind, AuditLog, AuditStatus};
use crate::{PipelineError, Result};
use async_trait::async_trait;
use chrono::Utc;
use filer_config::ReportConfig;
use filer_report::{
    error_instance, generate, Aggregator, InstanceStatus, ReportError, ReportStore,
};
use filer_submit::{SubmissionEngine, SubmissionResult, SubmissionStatus};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunOutcome {
    /// Created instance id
    pub instance_id: String,
    /// Final instance status
    pub status: InstanceStatus,
    /// Submission results, when submission ran
    pub submissions: Vec<SubmissionResult>,
    /// Warnings recorded during the run
    pub warnings: Vec<String>,
    /// Errors recorded during the run
    pub errors: Vec<String>,
}

/// Seam for the scheduler; `PipelineRunner` is the production
/// implementation
#[async_trait]
pub trait RunPipeline: Send + Sync {
    /// Execute one run of the configuration
    async fn run(
        &self,
        config_id: &str,
        config: &ReportConfig,
        cancel: CancellationToken,
    ) -> Result<RunOutcome>;
}

/// Orchestrates aggregate, generate, persist, and submit for one run
pub struct PipelineRunner {
    aggregator: Aggregator,
    engine: SubmissionEngine,
    store: Arc<dyn ReportStore>,
    audit: Arc<dyn AuditLog>,
    notifier: Arc<dyn Notifier>,
}

impl PipelineRunner {
    /// Wire a runner from its collaborators
    pub fn new(
        aggregator: Aggregator,
        engine: SubmissionEngine,
        store: Arc<dyn ReportStore>,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            aggregator,
            engine,
            store,
            audit,
            notifier,
        }
    }

    async fn run_inner(
        &self,
        config_id: &str,
        config: &ReportConfig,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let period = config.frequency.previous_period(Utc::now());
        let started = Instant::now();
        info!(report = %config_id, period = %period, "pipeline run starting");

        let aggregation = match self
            .aggregator
            .aggregate(config_id, config, &period, &cancel)
            .await
        {
            Ok(aggregation) => aggregation,
            Err(ReportError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(e) => {
                // A failed run still leaves an instance with the failure
                // surfaced; there is no silent path
                let message = e.to_string();
                self.audit.append(
                    AuditEvent::new(AuditEventKind::Fetch, AuditStatus::Error)
                        .config(config_id)
                        .error_message(&message)
                        .response_time(started.elapsed().as_millis() as u64),
                );

                let instance = error_instance(config_id, config, period, &message);
                self.store.create(&instance).await?;

                notify_outcome(
                    self.notifier.as_ref(),
                    &config.notifications,
                    false,
                    &format!("Report '{}' failed", config.name),
                    &message,
                );

                return Ok(RunOutcome {
                    instance_id: instance.id,
                    status: InstanceStatus::Error,
                    submissions: Vec::new(),
                    warnings: Vec::new(),
                    errors: vec![message],
                });
            }
        };

        for source in &aggregation.sources {
            let status = if source.available {
                AuditStatus::Success
            } else {
                AuditStatus::Warning
            };
            self.audit.append(
                AuditEvent::new(AuditEventKind::Fetch, status)
                    .config(config_id)
                    .connector(&source.source_id)
                    .detail(json!({
                        "fetched": source.fetched,
                        "invalid": source.invalid,
                        "blocked": source.blocked,
                        "quality": source.quality,
                    })),
            );
        }
        self.audit.append(
            AuditEvent::new(
                AuditEventKind::Validate,
                if aggregation.blocked {
                    AuditStatus::Warning
                } else {
                    AuditStatus::Success
                },
            )
            .config(config_id)
            .detail(json!({
                "outcomes": aggregation.outcomes.len(),
                "failed": aggregation.outcomes.iter().filter(|o| !o.passed).count(),
                "blocked": aggregation.blocked,
            })),
        );

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let (mut instance, _artifact) = generate(config_id, config, &aggregation)?;
        self.store.create(&instance).await?;
        self.audit.append(
            AuditEvent::new(
                AuditEventKind::Generate,
                if instance.status == InstanceStatus::Review {
                    AuditStatus::Warning
                } else {
                    AuditStatus::Success
                },
            )
            .config(config_id)
            .response_time(started.elapsed().as_millis() as u64)
            .detail(json!({
                "instance": instance.id,
                "quality": instance.quality_score,
            })),
        );

        let mut submissions = Vec::new();
        if instance.status == InstanceStatus::Generated
            && config.auto_submit
            && config.submission.enabled
        {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            submissions = self
                .engine
                .submit(&instance, &config.submission, false)
                .await?;

            for result in &submissions {
                let status = match result.status {
                    SubmissionStatus::Success => AuditStatus::Success,
                    SubmissionStatus::Pending => AuditStatus::Warning,
                    SubmissionStatus::Failed => AuditStatus::Error,
                };
                let mut event = AuditEvent::new(AuditEventKind::Submit, status)
                    .config(config_id)
                    .detail(json!({
                        "submission": result.submission_id,
                        "target": result.target,
                        "attempts": result.attempts,
                        "retries": result.retries,
                    }));
                if result.status == SubmissionStatus::Failed {
                    event = event.error_message(&result.message);
                }
                self.audit.append(event);
            }

            instance.status = next_status(&instance, &submissions);
            instance.updated_at = Utc::now();
            instance.submissions.extend(
                submissions
                    .iter()
                    .filter_map(|r| serde_json::to_value(r).ok()),
            );
            if instance.status == InstanceStatus::Error {
                instance
                    .errors
                    .extend(submissions.iter().filter_map(|r| {
                        (r.status == SubmissionStatus::Failed).then(|| r.message.clone())
                    }));
            }
            self.store.update(&instance).await?;
        } else if instance.status == InstanceStatus::Review {
            warn!(
                report = %config_id,
                instance = %instance.id,
                "report blocked by validation, auto-submit suppressed"
            );
        }

        let succeeded = matches!(
            instance.status,
            InstanceStatus::Generated | InstanceStatus::Submitted
        );
        notify_outcome(
            self.notifier.as_ref(),
            &config.notifications,
            succeeded,
            &format!("Report '{}': {:?}", config.name, instance.status),
            &format!(
                "instance {} finished with status {:?}, quality {:.1}",
                instance.id, instance.status, instance.quality_score
            ),
        );

        info!(
            report = %config_id,
            instance = %instance.id,
            status = ?instance.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline run finished"
        );

        Ok(RunOutcome {
            instance_id: instance.id,
            status: instance.status,
            submissions,
            warnings: aggregation.warnings,
            errors: instance.errors,
        })
    }
}

/// Final status after submission results are in
///
/// Empty results (nothing configured) leave the instance generated; any
/// failure outweighs pending; all-success means submitted.
fn next_status(
    instance: &filer_report::ReportInstance,
    submissions: &[SubmissionResult],
) -> InstanceStatus {
    if submissions.is_empty() {
        return instance.status;
    }
    if submissions
        .iter()
        .any(|r| r.status == SubmissionStatus::Failed)
    {
        return InstanceStatus::Error;
    }
    if submissions
        .iter()
        .all(|r| r.status == SubmissionStatus::Success)
    {
        return InstanceStatus::Submitted;
    }
    // Pending confirmations: stays generated until they settle
    InstanceStatus::Generated
}

#[async_trait]
impl RunPipeline for PipelineRunner {
    async fn run(
        &self,
        config_id: &str,
        config: &ReportConfig,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        self.run_inner(config_id, config, cancel).await
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
