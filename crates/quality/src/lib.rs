//! Filer - Quality
//!
//! Declarative data-quality validation with optional auto-remediation.
//!
//! # Overview
//!
//! Validation rules run against transformed records before a report is
//! assembled. Every rule executes independently (no fail-fast), producing
//! one [`RuleOutcome`] per rule. Failing error-severity rules that declare
//! an [`AutoRemediation`] get one fix-and-revalidate attempt; a rule that
//! still fails, or fails with no remediation, blocks submission of the
//! report the record belongs to.
//!
//! # Severity semantics
//!
//! - `Error`: blocks submission unless remediated
//! - `Warning` / `Info`: recorded, never blocks
//!
//! # Example
//!
//! ```ignore
//! use filer_quality::{validate, remediate_and_revalidate, NoLookup};
//!
//! let outcomes = validate(&record, &rules);
//! let report = remediate_and_revalidate(&mut record, &rules, &NoLookup).await;
//! if report.blocked {
//!     // record cannot be part of a submitted report
//! }
//! ```

mod error;
mod remediation;
mod rule;
mod validator;

pub use error::QualityError;
pub use remediation::{AutoRemediation, LookupProvider, NoLookup};
pub use rule::{CompareOp, FormatPattern, RuleKind, Severity, ValidationRule};
pub use validator::{remediate_and_revalidate, validate, RuleOutcome, ValidationReport};

/// Result type for quality operations
pub type Result<T> = std::result::Result<T, QualityError>;
