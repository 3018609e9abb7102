//! Per-connector circuit breaker
//!
//! Explicit three-state machine. Time is measured with `tokio::time`
//! instants so tests can drive transitions with a paused clock.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Breaker state as observed by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests flow normally
    Closed,
    /// Requests are blocked until the recovery timeout elapses
    Open,
    /// One trial request is allowed; its outcome decides the next state
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker for one connector
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker
    pub fn new(name: impl Into<String>, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Current state, applying the open-to-half-open timeout transition
    pub fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock();
        if inner.state == BreakerState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.recovery_timeout {
                    inner.state = BreakerState::HalfOpen;
                    debug!(connector = %self.name, "circuit breaker half-open");
                }
            }
        }
        inner.state
    }

    /// Whether work may be dispatched for this connector
    ///
    /// Half-open allows exactly the trial probe through.
    pub fn allows_request(&self) -> bool {
        self.state() != BreakerState::Open
    }

    /// Record a successful probe
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let was_open = inner.state != BreakerState::Closed;
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        if was_open {
            debug!(connector = %self.name, "circuit breaker closed");
        }
    }

    /// Record a failed probe; returns true when the circuit just opened
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock();

        // Refresh the half-open transition before deciding
        if inner.state == BreakerState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.recovery_timeout {
                    inner.state = BreakerState::HalfOpen;
                }
            }
        }

        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                warn!(connector = %self.name, "trial probe failed, circuit re-opened");
                true
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        connector = %self.name,
                        failures = inner.consecutive_failures,
                        "circuit breaker opened"
                    );
                    true
                } else {
                    false
                }
            }
            BreakerState::Open => false,
        }
    }

    /// Consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }
}

#[cfg(test)]
#[path = "breaker_test.rs"]
mod tests;
