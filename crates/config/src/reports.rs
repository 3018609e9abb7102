//! Automated report configuration types
//!
//! A report configuration wires data source mappings, transformation and
//! validation rules, and a submission plan to a reporting frequency.
//!
//! # Example
//!
//! ```toml
//! [reports.osfi_monthly]
//! name = "OSFI operational risk report"
//! template_id = "osfi-op-risk"
//! frequency = "monthly"
//! auto_generate = true
//! auto_validate = true
//! auto_submit = false
//!
//! [[reports.osfi_monthly.mappings]]
//! source_type = "core_banking"
//! source_id = "kri_logs"
//! target_field = "kri_summary"
//! required = true
//!
//! [[reports.osfi_monthly.mappings.transforms]]
//! type = "mapping"
//! source_field = "value"
//! target_field = "kri_value"
//! ```

use crate::submission::SubmissionConfig;
use filer_quality::ValidationRule;
use filer_record::{Frequency, SourceType};
use filer_transform::TransformationRule;
use serde::Deserialize;
use std::collections::HashMap;

/// Container for all report configurations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Named report configurations
    #[serde(flatten)]
    reports: HashMap<String, ReportConfig>,
}

impl ReportsConfig {
    /// Get a report config by id
    pub fn get(&self, id: &str) -> Option<&ReportConfig> {
        self.reports.get(id)
    }

    /// Check if a report exists
    pub fn contains(&self, id: &str) -> bool {
        self.reports.contains_key(id)
    }

    /// Iterate over all reports
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReportConfig)> {
        self.reports.iter()
    }

    /// Get the number of configured reports
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Check if no reports are configured
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Iterate over enabled reports only
    pub fn enabled(&self) -> impl Iterator<Item = (&String, &ReportConfig)> {
        self.reports.iter().filter(|(_, r)| r.enabled)
    }
}

/// Maps one data source into the report
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    /// Kind of source system
    pub source_type: SourceType,

    /// Connector id providing the data
    pub source_id: String,

    /// Report field this mapping populates
    pub target_field: String,

    /// When true, a source failure fails the whole run instead of
    /// zero-weighting the source
    #[serde(default)]
    pub required: bool,

    /// Ordered transformation rules
    #[serde(default)]
    pub transforms: Vec<TransformationRule>,

    /// Data-quality rules applied to this mapping's records
    #[serde(default)]
    pub checks: Vec<ValidationRule>,
}

/// Who gets told about run outcomes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Recipient addresses
    pub recipients: Vec<String>,

    /// Notify on successful generation/submission
    pub on_success: bool,

    /// Notify on failures and blocked reports
    pub on_failure: bool,
}

/// One automated report configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Human-readable report name
    pub name: String,

    /// Template in the report store this config instantiates
    pub template_id: String,

    /// Reporting frequency; drives period calculation and scheduling
    pub frequency: Frequency,

    /// Generate the report automatically on schedule
    #[serde(default = "default_true")]
    pub auto_generate: bool,

    /// Run validation during aggregation
    #[serde(default = "default_true")]
    pub auto_validate: bool,

    /// Submit automatically when generation succeeds unblocked
    #[serde(default)]
    pub auto_submit: bool,

    /// Data sources feeding this report
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,

    /// Report-level validation rules, applied to every record after the
    /// mapping-level checks
    #[serde(default)]
    pub validations: Vec<ValidationRule>,

    /// Submission plan
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Notification recipients and triggers
    #[serde(default)]
    pub notifications: NotificationSettings,

    /// Whether the scheduler picks this report up
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cron override; when unset, the frequency's default schedule applies
    #[serde(default)]
    pub schedule: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ReportConfig {
    /// The cron expression driving this report's ticks
    pub fn effective_schedule(&self) -> &str {
        self.schedule
            .as_deref()
            .unwrap_or_else(|| self.frequency.default_schedule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_defaults() {
        let toml = r#"
[quarterly_cdic]
name = "CDIC quarterly return"
template_id = "cdic-q"
frequency = "quarterly"
"#;
        let config: ReportsConfig = toml::from_str(toml).unwrap();
        let report = config.get("quarterly_cdic").unwrap();
        assert!(report.auto_generate);
        assert!(report.auto_validate);
        assert!(!report.auto_submit);
        assert!(report.enabled);
        assert_eq!(report.effective_schedule(), "0 45 0 1 1,4,7,10 *");
    }

    #[test]
    fn test_mapping_with_rules() {
        let toml = r#"
[m]
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[m.mappings]]
source_type = "incident"
source_id = "itsm"
target_field = "incidents"
required = true

[[m.mappings.transforms]]
type = "mapping"
source_field = "sev"
target_field = "severity"

[[m.mappings.checks]]
id = "sev-complete"
name = "Severity present"
check = "completeness"
field = "severity"
severity = "error"
message = "severity missing"
"#;
        let config: ReportsConfig = toml::from_str(toml).unwrap();
        let mapping = &config.get("m").unwrap().mappings[0];
        assert!(mapping.required);
        assert_eq!(mapping.transforms.len(), 1);
        assert_eq!(mapping.checks.len(), 1);
    }

    #[test]
    fn test_schedule_override() {
        let toml = r#"
[d]
name = "Daily"
template_id = "t"
frequency = "daily"
schedule = "0 0 6 * * *"
"#;
        let config: ReportsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.get("d").unwrap().effective_schedule(), "0 0 6 * * *");
    }

    #[test]
    fn test_enabled_filter() {
        let toml = r#"
[a]
name = "A"
template_id = "t"
frequency = "daily"

[b]
name = "B"
template_id = "t"
frequency = "daily"
enabled = false
"#;
        let config: ReportsConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.enabled().count(), 1);
    }
}
