//! Report generation
//!
//! Turns an aggregation result into a versioned report instance with a
//! calendar-derived due date, a JSON payload, and checksummed artifacts.

use crate::aggregator::AggregationResult;
use crate::instance::{next_instance_id, ArtifactRef, InstanceStatus, ReportInstance};
use crate::{ReportError, Result};
use chrono::{Duration, Utc};
use filer_config::ReportConfig;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::info;

/// Generate a report instance from an aggregation result
///
/// Deterministic given the same aggregation result and config, modulo the
/// instance id and timestamps. A blocked aggregation yields `Review`
/// status; an unblocked one yields `Generated`.
pub fn generate(
    config_id: &str,
    config: &ReportConfig,
    aggregation: &AggregationResult,
) -> Result<(ReportInstance, Vec<u8>)> {
    let now = Utc::now();
    let period = aggregation.period;
    let id = next_instance_id(config_id, &period);

    let payload = json!({
        "report": config.name,
        "template_id": config.template_id,
        "frequency": config.frequency.as_str(),
        "period": {
            "start": period.start.to_rfc3339(),
            "end": period.end.to_rfc3339(),
        },
        "quality": {
            "completeness": aggregation.quality.completeness,
            "accuracy": aggregation.quality.accuracy,
            "consistency": aggregation.quality.consistency,
            "timeliness": aggregation.quality.timeliness,
            "overall": aggregation.quality.overall(),
        },
        "sources": aggregation.sources,
        "data": aggregation.data,
    });

    let artifact_bytes =
        serde_json::to_vec_pretty(&payload).map_err(|e| ReportError::Payload(e.to_string()))?;
    let artifact = ArtifactRef {
        file_id: format!("{}.json", id),
        kind: "json".to_string(),
        sha256: hex_digest(&artifact_bytes),
        size: artifact_bytes.len() as u64,
    };

    let status = if aggregation.blocked {
        InstanceStatus::Review
    } else {
        InstanceStatus::Generated
    };

    let instance = ReportInstance {
        id,
        config_id: config_id.to_string(),
        period,
        due_date: period.end + Duration::days(config.frequency.due_after_days()),
        status,
        payload,
        source_counts: aggregation
            .sources
            .iter()
            .map(|s| (s.target_field.clone(), s.fetched - s.invalid - s.blocked))
            .collect(),
        quality_score: aggregation.quality.overall(),
        validation_results: aggregation.outcomes.clone(),
        warnings: aggregation.warnings.clone(),
        errors: Vec::new(),
        artifacts: vec![artifact],
        submissions: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    info!(
        instance = %instance.id,
        status = ?instance.status,
        quality = instance.quality_score,
        "report generated"
    );

    Ok((instance, artifact_bytes))
}

/// Build an error-status instance for a failed run
///
/// Every run produces an instance; a run that fails before generation
/// still leaves this record with the failure surfaced in `errors`.
pub fn error_instance(
    config_id: &str,
    config: &ReportConfig,
    period: filer_record::ReportingPeriod,
    message: impl Into<String>,
) -> ReportInstance {
    let now = Utc::now();
    ReportInstance {
        id: next_instance_id(config_id, &period),
        config_id: config_id.to_string(),
        period,
        due_date: period.end + Duration::days(config.frequency.due_after_days()),
        status: InstanceStatus::Error,
        payload: json!({}),
        source_counts: Vec::new(),
        quality_score: 0.0,
        validation_results: Vec::new(),
        warnings: Vec::new(),
        errors: vec![message.into()],
        artifacts: Vec::new(),
        submissions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Recompute an artifact's checksum and compare
///
/// Used on every artifact re-read to detect corruption.
pub fn verify_artifact(artifact: &ArtifactRef, bytes: &[u8]) -> bool {
    artifact.size == bytes.len() as u64 && artifact.sha256 == hex_digest(bytes)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
