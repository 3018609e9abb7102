//! Submission configuration types
//!
//! # Example
//!
//! ```toml
//! [reports.osfi_monthly.submission]
//! enabled = true
//!
//! [[reports.osfi_monthly.submission.targets]]
//! target = "osfi_portal"
//! format = "xml"
//! endpoint = "https://rrs.osfi.internal/submit"
//! requires_confirmation = true
//!
//! [reports.osfi_monthly.submission.targets.retry]
//! max_retries = 3
//! backoff = "exponential"
//! retry_interval_minutes = 5
//! ```

use serde::Deserialize;
use std::time::Duration;

/// External authority or channel a report is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// OSFI regulatory reporting portal
    OsfiPortal,
    /// CDIC portal
    CdicPortal,
    /// Email delivery
    Email,
    /// Generic API endpoint
    ApiEndpoint,
}

impl TargetKind {
    /// Stable string form for logs and audit events
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::OsfiPortal => "osfi_portal",
            TargetKind::CdicPortal => "cdic_portal",
            TargetKind::Email => "email",
            TargetKind::ApiEndpoint => "api_endpoint",
        }
    }
}

/// Payload format rendered for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    Xml,
    Excel,
    Pdf,
    #[default]
    Json,
}

/// Backoff strategy between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Linear,
    #[default]
    Exponential,
}

/// Retry policy for transient submission failures
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    /// Maximum retry attempts after the initial try
    pub max_retries: u32,

    /// Backoff strategy
    pub backoff: BackoffKind,

    /// Base interval between retries, in minutes
    pub retry_interval_minutes: u64,

    /// Upper bound on any single delay, in minutes
    pub max_delay_minutes: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffKind::Exponential,
            retry_interval_minutes: 5,
            max_delay_minutes: 60,
        }
    }
}

impl RetryPolicyConfig {
    /// Delay before retry attempt N (0-based), bounded by the max delay
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.retry_interval_minutes * 60;
        let secs = match self.backoff {
            BackoffKind::Linear => base.saturating_mul(attempt as u64 + 1),
            BackoffKind::Exponential => base.saturating_mul(1 << attempt.min(16)),
        };
        Duration::from_secs(secs.min(self.max_delay_minutes * 60))
    }
}

/// One delivery target for a report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmissionTarget {
    /// Where the report goes
    pub target: TargetKind,

    /// Payload format rendered for this target
    #[serde(default)]
    pub format: PayloadFormat,

    /// Endpoint URL (portals, api_endpoint) or address (email)
    pub endpoint: String,

    /// Whether delivery acceptance requires an external confirmation
    /// before the submission counts as success
    #[serde(default)]
    pub requires_confirmation: bool,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryPolicyConfig,

    /// Minutes a pending confirmation may stay open before it is
    /// escalated to failed
    #[serde(default = "default_max_pending_minutes")]
    pub max_pending_minutes: u64,
}

fn default_max_pending_minutes() -> u64 {
    1440
}

/// Submission section of a report configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Master switch; when false, submit is a no-op
    pub enabled: bool,

    /// Delivery targets, each with its own format and retry policy
    pub targets: Vec<SubmissionTarget>,
}
