//! Report instance types

use chrono::{DateTime, Utc};
use filer_quality::RuleOutcome;
use filer_record::ReportingPeriod;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle status of a report instance
///
/// `Submitted` is terminal; an instance never leaves it and becomes
/// immutable. `Error` is terminal once archived by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Pipeline run in flight
    InProgress,
    /// Generated and unblocked; ready for submission
    Generated,
    /// Delivered to every configured target
    Submitted,
    /// Blocked by validation; needs operator review
    Review,
    /// The run failed
    Error,
}

/// Reference to a generated artifact with its integrity checksum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Stable artifact id
    pub file_id: String,
    /// Artifact kind (e.g. "json")
    pub kind: String,
    /// Hex SHA-256 of the artifact bytes; recomputed and compared on
    /// every re-read
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
}

/// One versioned run of a report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInstance {
    /// Instance id
    pub id: String,

    /// Report configuration this instance was generated from
    pub config_id: String,

    /// Period the report covers
    pub period: ReportingPeriod,

    /// When the report is due at the authority
    pub due_date: DateTime<Utc>,

    /// Lifecycle status
    pub status: InstanceStatus,

    /// Aggregated report payload
    pub payload: serde_json::Value,

    /// Per-source record counts, keyed by target field
    pub source_counts: Vec<(String, usize)>,

    /// Overall data-quality score (0..=100)
    pub quality_score: f64,

    /// Validation outcomes collected during aggregation
    pub validation_results: Vec<RuleOutcome>,

    /// Warnings recorded during the run (e.g. zero-weighted sources)
    pub warnings: Vec<String>,

    /// Errors recorded during the run
    pub errors: Vec<String>,

    /// Generated artifacts
    pub artifacts: Vec<ArtifactRef>,

    /// Submission results, appended as structured records after each
    /// delivery; never rewritten
    #[serde(default)]
    pub submissions: Vec<serde_json::Value>,

    /// When the instance was created
    pub created_at: DateTime<Utc>,

    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl ReportInstance {
    /// Whether the instance may still be mutated
    pub fn is_mutable(&self) -> bool {
        self.status != InstanceStatus::Submitted
    }
}

static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Build a unique instance id from the config and period
///
/// Ids embed the config id and period start so operators can read them;
/// the sequence suffix keeps forced re-runs distinct.
pub(crate) fn next_instance_id(config_id: &str, period: &ReportingPeriod) -> String {
    let seq = INSTANCE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "rpt-{}-{}-{:04}",
        config_id,
        period.start.format("%Y%m%d"),
        seq
    )
}
