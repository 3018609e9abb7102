//! `filer webhook-test` - fire the webhook test payload

use crate::context;
use anyhow::Result;
use clap::Args;
use filer_connectors::test_webhook;
use filer_pipeline::{AuditEvent, AuditEventKind, AuditStatus};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Arguments for `filer webhook-test`
#[derive(Args, Debug)]
pub struct WebhookArgs {
    /// Webhook URL to test
    #[arg(long)]
    pub url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

/// POST a test payload, audit the outcome, and print it
pub async fn run(config_path: &Path, args: WebhookArgs) -> Result<()> {
    let ctx = context::build(config_path)?;

    let result = test_webhook(&args.url, Duration::from_secs(args.timeout_secs)).await?;

    let status = if result.success {
        AuditStatus::Success
    } else {
        AuditStatus::Error
    };
    let mut event = AuditEvent::new(AuditEventKind::WebhookTest, status)
        .response_time(result.latency_ms)
        .detail(json!({"url": result.url, "status": result.status}));
    if let Some(error) = &result.error {
        event = event.error_message(error);
    }
    ctx.audit.append(event);

    if result.success {
        println!("ok: {} answered in {}ms", result.url, result.latency_ms);
    } else {
        println!(
            "failed: {} ({}ms): {}",
            result.url,
            result.latency_ms,
            result.error.as_deref().unwrap_or("unknown error"),
        );
    }
    Ok(())
}
