//! Health probes
//!
//! One probe evaluates three independent booleans against a connector:
//! connectivity (the endpoint answers), authentication (credentials are
//! accepted), and data flow (the endpoint serves data).

use crate::{HealthError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filer_config::{AuthMethod, ConnectorConfig};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Overall health derived from the three sub-checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// All three sub-checks pass
    Healthy,
    /// Reachable and authenticated, but no data flows
    Degraded,
    /// Unreachable or unauthenticated
    Down,
}

/// Raw result of one probe call
#[derive(Debug, Clone, Copy)]
pub struct ProbeOutcome {
    /// The endpoint answered at all
    pub connectivity: bool,
    /// Credentials were accepted
    pub authentication: bool,
    /// The endpoint served data
    pub data_flow: bool,
    /// Round-trip time in milliseconds
    pub response_time_ms: u64,
}

impl ProbeOutcome {
    /// Derive the overall status
    ///
    /// All three true is healthy; connectivity and auth without data flow
    /// is degraded; otherwise down.
    pub fn status(&self) -> HealthStatus {
        match (self.connectivity, self.authentication, self.data_flow) {
            (true, true, true) => HealthStatus::Healthy,
            (true, true, false) => HealthStatus::Degraded,
            _ => HealthStatus::Down,
        }
    }
}

/// One recorded health check
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Connector id
    pub connector_id: String,
    /// Derived status
    pub status: HealthStatus,
    /// The endpoint answered
    pub connectivity: bool,
    /// Credentials were accepted
    pub authentication: bool,
    /// Data flows
    pub data_flow: bool,
    /// Round-trip time in milliseconds
    pub response_time_ms: u64,
    /// When the probe ran
    pub checked_at: DateTime<Utc>,
}

impl HealthCheck {
    /// Build a check record from a probe outcome
    pub fn from_outcome(connector_id: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            connector_id: connector_id.into(),
            status: outcome.status(),
            connectivity: outcome.connectivity,
            authentication: outcome.authentication,
            data_flow: outcome.data_flow,
            response_time_ms: outcome.response_time_ms,
            checked_at: Utc::now(),
        }
    }
}

/// Probe transport, substitutable in tests
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Probe a connector's endpoint
    async fn probe(&self, connector_id: &str, config: &ConnectorConfig) -> ProbeOutcome;
}

/// HTTP prober for REST connectors
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Create the prober
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client construction fails.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("filer/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| HealthError::Init(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeClient for HttpProber {
    async fn probe(&self, _connector_id: &str, config: &ConnectorConfig) -> ProbeOutcome {
        // An expired credential fails authentication without a round trip
        if config.auth.is_expired(Utc::now()) {
            return ProbeOutcome {
                connectivity: true,
                authentication: false,
                data_flow: false,
                response_time_ms: 0,
            };
        }

        let mut request = self.client.get(&config.endpoint);
        request = match &config.auth.method {
            AuthMethod::None => request,
            AuthMethod::Bearer { token } => request.bearer_auth(token),
            AuthMethod::ApiKey { header, key } => request.header(header, key),
            AuthMethod::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthMethod::Certificate { path } => request.header("X-Client-Cert", path),
        };

        let started = Instant::now();
        let response = request.send().await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        match response {
            Ok(response) => {
                let status = response.status();
                let authentication = status != reqwest::StatusCode::UNAUTHORIZED
                    && status != reqwest::StatusCode::FORBIDDEN;
                let data_flow = status.is_success()
                    && response
                        .content_length()
                        .map_or(true, |len| len > 0);
                ProbeOutcome {
                    connectivity: true,
                    authentication,
                    data_flow,
                    response_time_ms,
                }
            }
            Err(_) => ProbeOutcome {
                connectivity: false,
                authentication: false,
                data_flow: false,
                response_time_ms,
            },
        }
    }
}
