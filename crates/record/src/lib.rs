//! Filer - Record
//!
//! Shared vocabulary types for the reporting pipeline: the generic `Record`
//! that flows from fetch through transform and validation, the source type
//! taxonomy, and reporting-period calendar arithmetic.
//!
//! # Design Principles
//!
//! - **Structural equality**: `Record` compares field-by-field so transform
//!   determinism is directly testable
//! - **Inclusive periods**: `ReportingPeriod` bounds are inclusive on both
//!   ends (`start <= ts <= end`)
//! - **Fixed calendars**: period derivation from a frequency uses calendar
//!   arithmetic, never 30-day approximations

mod period;
mod record;
mod source;

pub use period::{Frequency, ReportingPeriod};
pub use record::Record;
pub use source::SourceType;
