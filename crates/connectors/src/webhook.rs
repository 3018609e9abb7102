//! Webhook test surface
//!
//! Fires a JSON test payload at a configured URL and reports the result
//! with latency. Outcomes are logged and returned, never swallowed.

use crate::{ConnectorError, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a webhook test delivery
#[derive(Debug, Clone, Serialize)]
pub struct WebhookTestResult {
    /// Target URL
    pub url: String,
    /// Whether the endpoint accepted the payload (2xx)
    pub success: bool,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// Round-trip time in milliseconds
    pub latency_ms: u64,
    /// Failure detail, when not successful
    pub error: Option<String>,
}

/// POST a test payload to the webhook URL
///
/// # Errors
///
/// Returns error only on client construction failure; delivery failures
/// are reported inside the result.
pub async fn test_webhook(url: &str, timeout: Duration) -> Result<WebhookTestResult> {
    let client = reqwest::Client::builder()
        .user_agent("filer/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| ConnectorError::Init(format!("webhook HTTP client: {}", e)))?;

    let payload = json!({
        "event": "webhook_test",
        "source": "filer",
        "timestamp": Utc::now().to_rfc3339(),
    });

    let started = Instant::now();
    let response = client.post(url).json(&payload).send().await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let result = match response {
        Ok(response) => {
            let status = response.status();
            WebhookTestResult {
                url: url.to_string(),
                success: status.is_success(),
                status: Some(status.as_u16()),
                latency_ms,
                error: (!status.is_success()).then(|| format!("endpoint returned {}", status)),
            }
        }
        Err(e) => WebhookTestResult {
            url: url.to_string(),
            success: false,
            status: e.status().map(|s| s.as_u16()),
            latency_ms,
            error: Some(e.to_string()),
        },
    };

    if result.success {
        info!(url = %result.url, latency_ms = result.latency_ms, "webhook test succeeded");
    } else {
        warn!(
            url = %result.url,
            latency_ms = result.latency_ms,
            error = result.error.as_deref().unwrap_or("unknown"),
            "webhook test failed"
        );
    }

    Ok(result)
}
