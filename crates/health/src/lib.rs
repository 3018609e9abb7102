//! Filer - Health
//!
//! Independent health monitoring for connectors: periodic probes, a
//! per-connector circuit breaker, and deduplicated alerting.
//!
//! # Overview
//!
//! Each probe evaluates three independent checks - connectivity,
//! authentication, data flow - and derives an overall status:
//! all three true is `Healthy`; connectivity and auth without data flow
//! is `Degraded`; anything else is `Down`.
//!
//! The circuit breaker is an explicit three-state machine per connector:
//! `Closed -> Open` after `failure_threshold` consecutive failures,
//! `Open -> HalfOpen` once `recovery_timeout` elapses, and
//! `HalfOpen -> Closed` / `HalfOpen -> Open` on the next probe result.
//! While a circuit is open the scheduler skips that connector's work.
//!
//! Probing runs on its own interval, concurrently with pipeline runs and
//! fully parallel across connectors.

mod alerts;
mod breaker;
mod error;
mod monitor;
mod probe;

pub use alerts::{Alert, AlertKind, AlertManager, AlertSeverity};
pub use breaker::{BreakerState, CircuitBreaker};
pub use error::HealthError;
pub use monitor::HealthMonitor;
pub use probe::{HealthCheck, HealthStatus, HttpProber, ProbeClient, ProbeOutcome};

/// Result type for health operations
pub type Result<T> = std::result::Result<T, HealthError>;
