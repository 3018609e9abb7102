//! Tests for the data fetcher

use super::*;
use crate::ConnectorRegistry;
use filer_config::ConnectorsConfig;
use serde_json::json;

fn period() -> ReportingPeriod {
    ReportingPeriod::new(
        "2024-04-01T00:00:00Z".parse().unwrap(),
        "2024-04-30T23:59:59Z".parse().unwrap(),
    )
}

fn registry(connectors_toml: &str) -> Arc<ConnectorRegistry> {
    let config: ConnectorsConfig = toml::from_str(connectors_toml).unwrap();
    Arc::new(ConnectorRegistry::from_config(&config))
}

fn mapping(source_id: &str) -> MappingConfig {
    let toml = format!(
        r#"
source_type = "incident"
source_id = "{}"
target_field = "incidents"
"#,
        source_id
    );
    toml::from_str(&toml).unwrap()
}

#[test]
fn test_parse_records_filters_by_period() {
    let body = json!([
        { "timestamp": "2024-04-15T10:00:00Z", "severity": 3 },
        { "timestamp": "2024-03-31T23:59:59Z", "severity": 1 },
        { "timestamp": "2024-05-01T00:00:00Z", "severity": 2 },
        { "timestamp": "2024-04-30T23:59:59Z", "severity": 4 }
    ]);

    let records = parse_records("itsm", body, &period()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].number("severity"), Some(3.0));
    assert_eq!(records[1].number("severity"), Some(4.0));
}

#[test]
fn test_parse_records_accepts_wrapped_shape() {
    let body = json!({
        "records": [{ "date": "2024-04-10", "value": 7 }],
        "total": 1
    });

    let records = parse_records("grc", body, &period()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].timestamp,
        "2024-04-10T00:00:00Z".parse::<chrono::DateTime<Utc>>().unwrap()
    );
}

#[test]
fn test_parse_records_rejects_non_list_body() {
    let err = parse_records("grc", json!("nope"), &period()).unwrap_err();
    assert!(matches!(err, ConnectorError::InvalidResponse { .. }));
}

#[test]
fn test_parse_records_skips_untimestamped() {
    let body = json!([
        { "severity": 3 },
        { "timestamp": "garbage", "severity": 1 },
        { "timestamp": "2024-04-15T10:00:00Z", "severity": 5 }
    ]);

    let records = parse_records("itsm", body, &period()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].number("severity"), Some(5.0));
}

#[tokio::test]
async fn test_unsupported_connection_kind() {
    let registry = registry(
        r#"
[warehouse]
system = "Core DB"
source_type = "incident"
connection = "database"
endpoint = "postgres://warehouse"
"#,
    );
    let fetcher = DataFetcher::new(Arc::clone(&registry)).unwrap();

    let err = fetcher.fetch(&mapping("warehouse"), &period()).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::UnsupportedSourceType { kind: "database", .. }
    ));
    // The failure is recorded against the connector
    assert_eq!(registry.snapshot("warehouse").unwrap().error_count, 1);
}

#[tokio::test]
async fn test_expired_credential_is_auth_failure() {
    let registry = registry(
        r#"
[grc]
system = "GRC"
source_type = "incident"
endpoint = "https://grc.internal/api"

[grc.auth]
type = "bearer"
token = "stale"
expires_at = "2020-01-01T00:00:00Z"
"#,
    );
    let fetcher = DataFetcher::new(Arc::clone(&registry)).unwrap();

    let err = fetcher.fetch(&mapping("grc"), &period()).await.unwrap_err();
    assert!(matches!(err, ConnectorError::AuthFailure { .. }));
}

#[tokio::test]
async fn test_unknown_connector() {
    let registry = registry("");
    let fetcher = DataFetcher::new(registry).unwrap();

    let err = fetcher.fetch(&mapping("ghost"), &period()).await.unwrap_err();
    assert!(matches!(err, ConnectorError::Unknown(_)));
}
