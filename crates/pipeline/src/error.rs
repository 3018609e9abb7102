//! Error types for pipeline runs

use filer_report::ReportError;
use filer_submit::SubmitError;
use thiserror::Error;

/// Errors that can fail a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Aggregation or generation failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Submission failed in a way that is not captured per-target
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The run was cancelled at a stage boundary
    #[error("pipeline run cancelled")]
    Cancelled,
}
