//! Delivery clients
//!
//! One HTTP client covers all built-in targets: regulatory portals and
//! generic API endpoints receive the rendered payload directly; email
//! targets post a message envelope to the configured mail gateway.

use crate::{Result, SubmitError};
use async_trait::async_trait;
use filer_config::{PayloadFormat, SubmissionTarget, TargetKind};
use serde_json::json;

/// What the target answered on acceptance
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Reference assigned by the external system, when provided
    pub external_reference: Option<String>,
    /// Response message or status line
    pub message: String,
}

/// One delivery attempt to a target
///
/// Implementations map their failures onto `Rejected` (non-retryable) or
/// `Transient` (retryable); the engine's retry policy keys off that split.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Deliver the rendered payload to the target
    async fn deliver(
        &self,
        target: &SubmissionTarget,
        instance_id: &str,
        payload: &[u8],
    ) -> Result<DeliveryReceipt>;
}

/// HTTP delivery for portals, API endpoints, and mail gateways
pub struct HttpDeliveryClient {
    client: reqwest::Client,
}

impl HttpDeliveryClient {
    /// Create the delivery client
    ///
    /// # Errors
    ///
    /// Returns a `Rejected` error if HTTP client construction fails.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("filer/0.1")
            .build()
            .map_err(|e| SubmitError::Rejected {
                target: "http".into(),
                message: format!("HTTP client init: {}", e),
            })?;
        Ok(Self { client })
    }

    fn content_type(format: PayloadFormat) -> &'static str {
        match format {
            PayloadFormat::Json => "application/json",
            PayloadFormat::Xml => "application/xml",
            PayloadFormat::Excel => "text/csv",
            PayloadFormat::Pdf => "application/pdf",
        }
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(
        &self,
        target: &SubmissionTarget,
        instance_id: &str,
        payload: &[u8],
    ) -> Result<DeliveryReceipt> {
        let target_name = target.target.as_str();

        let request = match target.target {
            TargetKind::Email => {
                // Mail gateway envelope; the gateway handles attachment
                // encoding and recipients
                self.client.post(&target.endpoint).json(&json!({
                    "subject": format!("Regulatory report {}", instance_id),
                    "report_id": instance_id,
                    "attachment_format": Self::content_type(target.format),
                    "attachment": String::from_utf8_lossy(payload),
                }))
            }
            TargetKind::OsfiPortal | TargetKind::CdicPortal | TargetKind::ApiEndpoint => self
                .client
                .post(&target.endpoint)
                .header("Content-Type", Self::content_type(target.format))
                .header("X-Report-Id", instance_id)
                .body(payload.to_vec()),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                SubmitError::Transient {
                    target: target_name.into(),
                    message: e.to_string(),
                }
            } else {
                SubmitError::Rejected {
                    target: target_name.into(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or(json!({}));
            let external_reference = body
                .get("reference")
                .or_else(|| body.get("submission_id"))
                .and_then(|v| v.as_str())
                .map(String::from);
            return Ok(DeliveryReceipt {
                external_reference,
                message: format!("accepted with {}", status),
            });
        }

        if status.is_server_error() || status.as_u16() == 429 {
            Err(SubmitError::Transient {
                target: target_name.into(),
                message: format!("endpoint returned {}", status),
            })
        } else {
            Err(SubmitError::Rejected {
                target: target_name.into(),
                message: format!("endpoint returned {}", status),
            })
        }
    }
}
