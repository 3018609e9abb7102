//! Error types for scheduling

use thiserror::Error;

/// Errors that can occur while building or running the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A schedule expression failed to parse
    #[error("invalid cron schedule '{schedule}' for '{name}': {message}")]
    InvalidSchedule {
        /// Report or connector carrying the schedule
        name: String,
        /// The schedule expression
        schedule: String,
        /// Parser error
        message: String,
    },
}
