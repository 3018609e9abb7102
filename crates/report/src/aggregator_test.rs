//! Tests for aggregation, including partial-failure semantics

use super::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filer_config::MappingConfig;
use filer_connectors::ConnectorError;
use filer_quality::NoLookup;
use serde_json::json;

/// Canned fetcher: one behavior per connector id
struct StubFetcher;

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        mapping: &MappingConfig,
        period: &ReportingPeriod,
    ) -> filer_connectors::Result<Vec<Record>> {
        match mapping.source_id.as_str() {
            "kri_logs" => Ok((0..10)
                .map(|i| {
                    let mut r = Record::new(period.start + chrono::Duration::hours(i));
                    r.set("value", json!(i * 10));
                    r.set("metric", json!("kri"));
                    r
                })
                .collect()),
            "one_bad_record" => Ok((0..50)
                .map(|i| {
                    let mut r = Record::new(period.start);
                    // Record 13 misses the field the error rule requires
                    if i != 13 {
                        r.set("severity", json!(2));
                    }
                    r.set("index", json!(i));
                    r
                })
                .collect()),
            _ => Err(ConnectorError::SourceUnavailable {
                connector: mapping.source_id.clone(),
                message: "connection refused".into(),
            }),
        }
    }
}

fn period() -> ReportingPeriod {
    ReportingPeriod::new(
        "2024-04-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        "2024-04-30T23:59:59Z".parse::<DateTime<Utc>>().unwrap(),
    )
}

fn aggregator() -> Aggregator {
    Aggregator::new(Arc::new(StubFetcher), Arc::new(NoLookup))
}

fn config(toml: &str) -> ReportConfig {
    toml::from_str(toml).unwrap()
}

#[tokio::test]
async fn test_partial_failure_zero_weights_optional_source() {
    // KRI source delivers 10 records, incident source is unreachable and
    // not required: aggregation succeeds with a warning, quality < 100
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"

[[mappings]]
source_type = "incident"
source_id = "incidents_down"
target_field = "incidents"
"#,
    );

    let cancel = CancellationToken::new();
    let result = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap();

    assert!(!result.blocked);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("incidents_down"));
    assert_eq!(result.data["kri"].len(), 10);
    assert!(result.data["incidents"].is_empty());

    let incidents = &result.sources[1];
    assert!(!incidents.available);
    assert_eq!(incidents.quality, 0.0);

    assert!(result.quality.overall() < 100.0);
    assert_eq!(result.quality.timeliness, 0.5);
}

#[tokio::test]
async fn test_required_source_failure_fails_the_run() {
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "incident"
source_id = "incidents_down"
target_field = "incidents"
required = true
"#,
    );

    let cancel = CancellationToken::new();
    let err = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::RequiredSourceFailed { ref source, .. } if source == "incidents_down"
    ));
}

#[tokio::test]
async fn test_unremediated_error_rule_blocks_one_of_fifty() {
    // 1 of 50 records fails an error-severity rule with no remediation:
    // aggregation is blocked, the bad record is excluded
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "incident"
source_id = "one_bad_record"
target_field = "incidents"

[[mappings.checks]]
id = "sev-positive"
name = "Severity in policy range"
check = "business_logic"
expression = "severity >= 1 && severity <= 5"
severity = "error"
message = "severity outside policy range"
"#,
    );

    let cancel = CancellationToken::new();
    let result = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap();

    assert!(result.blocked);
    assert_eq!(result.data["incidents"].len(), 49);
    assert_eq!(result.sources[0].blocked, 1);
    assert_eq!(result.outcomes.len(), 50);
    assert_eq!(result.outcomes.iter().filter(|o| !o.passed).count(), 1);
}

#[tokio::test]
async fn test_transform_failure_marks_record_invalid() {
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"

[[mappings.transforms]]
type = "calculation"
target_field = "ratio"
expression = "value / missing_divisor"
"#,
    );

    let cancel = CancellationToken::new();
    let result = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap();

    // Every record fails the calculation, none survive, run not blocked
    assert!(!result.blocked);
    assert_eq!(result.sources[0].invalid, 10);
    assert!(result.data["kri"].is_empty());
    assert!(result.quality.accuracy < 1.0);
}

#[tokio::test]
async fn test_cancellation_between_sources() {
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "core_banking"
source_id = "kri_logs"
target_field = "kri"
"#,
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Cancelled));
}

#[tokio::test]
async fn test_remediation_keeps_record_and_run_unblocked() {
    let config = config(
        r#"
name = "Monthly"
template_id = "t"
frequency = "monthly"

[[mappings]]
source_type = "incident"
source_id = "one_bad_record"
target_field = "incidents"

[[mappings.checks]]
id = "sev-present"
name = "Severity present"
check = "completeness"
field = "severity"
severity = "error"
message = "severity missing"

[mappings.checks.remediation]
fix = "default_value"
field = "severity"
value = 1
"#,
    );

    let cancel = CancellationToken::new();
    let result = aggregator()
        .aggregate("m", &config, &period(), &cancel)
        .await
        .unwrap();

    assert!(!result.blocked);
    assert_eq!(result.data["incidents"].len(), 50);
    assert_eq!(result.outcomes.iter().filter(|o| o.remediated).count(), 1);
}
