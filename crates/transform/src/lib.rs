//! Filer - Transform
//!
//! Ordered field-level transformation of raw source records into the
//! target report shape.
//!
//! # Overview
//!
//! A data source mapping carries an ordered list of [`TransformationRule`]s.
//! Rules are applied in declaration order; each rule reads from the working
//! record (so later rules see the output of earlier ones) and writes exactly
//! one target field.
//!
//! # Design Principles
//!
//! - **Pure**: transformation has no observable effect outside the record
//!   being transformed, so records transform safely in parallel
//! - **Deterministic**: the same record and rule list always produce a
//!   byte-identical result
//! - **Closed rule set**: rule kinds are a tagged union matched
//!   exhaustively; an unknown rule or formatter name fails at config parse
//!   time, never as a silent runtime skip
//! - **No dynamic code**: calculations and conditions run through a small
//!   arithmetic/comparison AST evaluated over named fields
//!
//! # Example
//!
//! ```ignore
//! use filer_transform::{apply, TransformationRule, Formatter};
//!
//! let rules = vec![
//!     TransformationRule::Mapping {
//!         source_field: "amt".into(),
//!         target_field: "amount".into(),
//!     },
//!     TransformationRule::Calculation {
//!         target_field: "amount_cad".into(),
//!         expression: "amount * fx_rate".into(),
//!     },
//! ];
//!
//! let transformed = apply(&rules, &record)?;
//! ```

mod error;
pub mod expr;
mod rule;

pub use error::TransformError;
pub use expr::{Expr, Value as ExprValue};
pub use rule::{apply, Case, Formatter, TransformationRule};

/// Result type for transformation operations
pub type Result<T> = std::result::Result<T, TransformError>;
