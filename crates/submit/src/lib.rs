//! Filer - Submit
//!
//! Delivers generated reports to external targets with retry, idempotent
//! confirmation tracking, and per-target payload rendering.
//!
//! # Overview
//!
//! The [`SubmissionEngine`] renders the target's payload format
//! (xml/excel/pdf/json), performs the delivery call through a
//! [`DeliveryClient`], and applies the configured retry policy only to
//! transient failures (timeouts, 5xx) - never to rejections (auth,
//! malformed payload).
//!
//! A target that requires external confirmation yields a `Pending`
//! result, distinct from immediate success; `resolve_confirmation` and
//! `expire_pending` settle it later.
//!
//! Re-submitting an already-submitted instance fails with
//! `AlreadySubmitted` unless forced; the engine makes no external call in
//! that case.

mod delivery;
mod engine;
mod error;
mod payload;

pub use delivery::{DeliveryClient, DeliveryReceipt, HttpDeliveryClient};
pub use engine::{
    expire_pending, resolve_confirmation, SubmissionEngine, SubmissionResult, SubmissionStatus,
};
pub use error::SubmitError;
pub use payload::render;

/// Result type for submission operations
pub type Result<T> = std::result::Result<T, SubmitError>;
