//! Resilience utilities for connector I/O
//!
//! Provides timeout and retry with exponential backoff for fetch
//! operations. Circuit breaking lives in the health crate; this module
//! only covers the per-request retry loop.

use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default max retries for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Resilience configuration for a connector
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each retry)
    pub retry_base_delay_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ResilienceConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get retry delay for attempt N (exponential backoff, capped at 64x)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.retry_base_delay_ms * (1 << attempt.min(6));
        Duration::from_millis(delay_ms)
    }
}

/// Error from a retried operation
#[derive(Debug)]
pub enum RetryError<E> {
    /// All retry attempts exhausted; carries the last error
    Exhausted { attempts: u32, last_error: E },
    /// The operation failed with a non-retryable error
    Permanent(E),
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last_error } => {
                write!(f, "failed after {} attempts: {}", attempts, last_error)
            }
            RetryError::Permanent(e) => write!(f, "permanent error: {}", e),
        }
    }
}

/// Execute an operation with timeout and retry
///
/// `is_retryable` classifies errors; non-retryable errors return
/// immediately as `Permanent`. A timeout counts as retryable and is
/// reported through `on_timeout`.
pub async fn execute_with_retry<F, Fut, T, E, R, OT>(
    config: &ResilienceConfig,
    operation_name: &str,
    mut operation: F,
    is_retryable: R,
    on_timeout: OT,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    OT: Fn() -> E,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = config.retry_delay(attempt - 1);
            debug!(
                operation = operation_name,
                attempt,
                delay_ms = delay.as_millis(),
                "retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match timeout(config.timeout(), operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                if !is_retryable(&e) {
                    return Err(RetryError::Permanent(e));
                }
                debug!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    "request failed, will retry"
                );
                last_error = Some(e);
            }
            Err(_) => {
                debug!(
                    operation = operation_name,
                    attempt,
                    timeout_secs = config.timeout_secs,
                    "request timed out, will retry"
                );
                last_error = Some(on_timeout());
            }
        }
    }

    match last_error {
        Some(last_error) => Err(RetryError::Exhausted {
            attempts: config.max_retries + 1,
            last_error,
        }),
        // Unreachable in practice: the loop always records an error first
        None => Err(RetryError::Exhausted {
            attempts: config.max_retries + 1,
            last_error: on_timeout(),
        }),
    }
}

/// Determines if an HTTP error is retryable
///
/// Retry on timeout, connection errors, 5xx responses, and rate limits.
pub fn is_retryable_http(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }

    if let Some(status) = error.status() {
        return status.is_server_error() || status.as_u16() == 429;
    }

    false
}

#[cfg(test)]
#[path = "resilience_test.rs"]
mod tests;
