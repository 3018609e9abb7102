//! Data fetcher
//!
//! Retrieves raw records from a mapped source for a reporting period.
//! REST sources are implemented with reqwest; other connection kinds are
//! dispatched through [`SourceClient`] so deployments can register their
//! own database/file/queue clients.

use crate::registry::ConnectorRegistry;
use crate::resilience::{
    execute_with_retry, is_retryable_http, ResilienceConfig, RetryError,
};
use crate::{ConnectorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use filer_config::{AuthMethod, ConnectionKind, ConnectorConfig, MappingConfig};
use filer_record::{Record, ReportingPeriod};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for one connection kind
///
/// The built-in set covers REST; database, file-transfer, and
/// message-queue clients plug in through this trait.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch raw records for the period from the connector's endpoint
    async fn fetch(
        &self,
        connector_id: &str,
        config: &ConnectorConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>>;
}

/// Mapping-level fetch seam used by the aggregator
///
/// `DataFetcher` is the production implementation; tests substitute
/// canned sources.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch records for one mapping, bounded by the reporting period
    async fn fetch(
        &self,
        mapping: &MappingConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>>;
}

/// Fetches records for data source mappings
pub struct DataFetcher {
    registry: Arc<ConnectorRegistry>,
    rest: RestClient,
}

impl DataFetcher {
    /// Create a fetcher over the given registry
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails (e.g., TLS
    /// misconfiguration).
    pub fn new(registry: Arc<ConnectorRegistry>) -> Result<Self> {
        Ok(Self {
            registry,
            rest: RestClient::new()?,
        })
    }

    /// Fetch records for one mapping, bounded by the reporting period
    ///
    /// Returned records satisfy `period.start <= timestamp <= period.end`
    /// exactly; anything outside the bounds is dropped even if the source
    /// returns it.
    pub async fn fetch(
        &self,
        mapping: &MappingConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>> {
        let handle = self.registry.get(&mapping.source_id)?;
        // Clone the config out of the shard; never hold the lock across IO
        let config = handle.read().config.clone();

        if config.auth.is_expired(Utc::now()) {
            self.registry.record_failure(&mapping.source_id)?;
            return Err(ConnectorError::AuthFailure {
                connector: mapping.source_id.clone(),
                message: "credential expired".into(),
            });
        }

        let result = match config.connection {
            ConnectionKind::Rest => {
                self.rest.fetch(&mapping.source_id, &config, period).await
            }
            other => Err(ConnectorError::UnsupportedSourceType {
                connector: mapping.source_id.clone(),
                kind: kind_name(other),
            }),
        };

        match &result {
            Ok(records) => {
                debug!(
                    connector = %mapping.source_id,
                    records = records.len(),
                    period = %period,
                    "fetch complete"
                );
                self.registry.record_success(&mapping.source_id, Utc::now())?;
            }
            Err(e) => {
                warn!(connector = %mapping.source_id, error = %e, "fetch failed");
                self.registry.record_failure(&mapping.source_id)?;
            }
        }

        result
    }
}

#[async_trait]
impl Fetcher for DataFetcher {
    async fn fetch(
        &self,
        mapping: &MappingConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>> {
        DataFetcher::fetch(self, mapping, period).await
    }
}

fn kind_name(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::Rest => "rest",
        ConnectionKind::Soap => "soap",
        ConnectionKind::Database => "database",
        ConnectionKind::FileTransfer => "file_transfer",
        ConnectionKind::MessageQueue => "message_queue",
    }
}

/// REST source client
struct RestClient {
    client: reqwest::Client,
}

impl RestClient {
    fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("filer/0.1")
            .build()
            .map_err(|e| ConnectorError::Init(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn build_request(
        &self,
        config: &ConnectorConfig,
        period: &ReportingPeriod,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(&config.endpoint)
            .query(&[
                ("start", period.start.to_rfc3339()),
                ("end", period.end.to_rfc3339()),
            ])
            .timeout(Duration::from_secs(config.timeout_secs));

        request = match &config.auth.method {
            AuthMethod::None => request,
            AuthMethod::Bearer { token } => request.bearer_auth(token),
            AuthMethod::ApiKey { header, key } => request.header(header, key),
            AuthMethod::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            // TLS client certs are configured on the client at deployment
            // level; the header carries the bundle path for the gateway
            AuthMethod::Certificate { path } => request.header("X-Client-Cert", path),
        };

        request
    }

    async fn fetch_once(
        &self,
        connector_id: &str,
        config: &ConnectorConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>> {
        let response = self
            .build_request(config, period)
            .send()
            .await
            .map_err(|e| classify_http_error(connector_id, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ConnectorError::AuthFailure {
                connector: connector_id.to_string(),
                message: format!("endpoint returned {}", status),
            });
        }
        if !status.is_success() {
            return Err(ConnectorError::SourceUnavailable {
                connector: connector_id.to_string(),
                message: format!("endpoint returned {}", status),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ConnectorError::InvalidResponse {
                connector: connector_id.to_string(),
                message: e.to_string(),
            })?;

        parse_records(connector_id, body, period)
    }
}

#[async_trait]
impl SourceClient for RestClient {
    async fn fetch(
        &self,
        connector_id: &str,
        config: &ConnectorConfig,
        period: &ReportingPeriod,
    ) -> Result<Vec<Record>> {
        let resilience = ResilienceConfig {
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            ..Default::default()
        };

        let result = execute_with_retry(
            &resilience,
            connector_id,
            || self.fetch_once(connector_id, config, period),
            ConnectorError::is_retryable,
            || ConnectorError::SourceUnavailable {
                connector: connector_id.to_string(),
                message: "request timed out".into(),
            },
        )
        .await;

        match result {
            Ok(records) => Ok(records),
            Err(RetryError::Permanent(e)) => Err(e),
            Err(RetryError::Exhausted { last_error, .. }) => Err(last_error),
        }
    }
}

fn classify_http_error(connector_id: &str, error: reqwest::Error) -> ConnectorError {
    if is_retryable_http(&error) {
        ConnectorError::SourceUnavailable {
            connector: connector_id.to_string(),
            message: error.to_string(),
        }
    } else {
        ConnectorError::InvalidResponse {
            connector: connector_id.to_string(),
            message: error.to_string(),
        }
    }
}

/// Parse a response body into period-bounded records
///
/// Accepts a bare JSON array or an object with a `records` array. Each
/// element must be an object; its timestamp is read from `timestamp`,
/// `date`, or `created_at`. Records without a parsable timestamp are
/// dropped with a warning, as are records outside the period.
fn parse_records(
    connector_id: &str,
    body: Value,
    period: &ReportingPeriod,
) -> Result<Vec<Record>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ConnectorError::InvalidResponse {
                    connector: connector_id.to_string(),
                    message: "expected an array or an object with 'records'".into(),
                })
            }
        },
        _ => {
            return Err(ConnectorError::InvalidResponse {
                connector: connector_id.to_string(),
                message: "expected an array or an object with 'records'".into(),
            })
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(fields) = item else {
            warn!(connector = %connector_id, "skipping non-object record");
            continue;
        };

        let Some(timestamp) = record_timestamp(&fields) else {
            warn!(connector = %connector_id, "skipping record without timestamp");
            continue;
        };

        if !period.contains(timestamp) {
            continue;
        }

        let mut record = Record::new(timestamp);
        for (key, value) in fields {
            record.set(key, value);
        }
        records.push(record);
    }

    Ok(records)
}

fn record_timestamp(fields: &serde_json::Map<String, Value>) -> Option<DateTime<Utc>> {
    for key in ["timestamp", "date", "created_at"] {
        if let Some(Value::String(s)) = fields.get(key) {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return d.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
