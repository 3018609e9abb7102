//! Validation rule definitions

use crate::remediation::AutoRemediation;
use filer_transform::Expr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks submission unless remediated
    Error,
    /// Recorded, never blocks
    Warning,
    /// Informational only
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Comparison operator for consistency rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Shape pattern for format rules
///
/// A closed set: an unknown pattern name fails at config parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPattern {
    /// RFC 3339 / ISO 8601 date or datetime
    IsoDate,
    /// Parseable as a finite number
    Numeric,
    /// Contains a plausible local@domain address
    Email,
    /// Non-empty after trimming
    NonEmpty,
}

/// What a validation rule checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RuleKind {
    /// The field is present and non-null
    Completeness { field: String },

    /// A numeric field falls inside an inclusive range
    Accuracy {
        field: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },

    /// Two fields of the same record agree under a comparison
    Consistency {
        field: String,
        op: CompareOp,
        other: String,
    },

    /// The field value matches a shape pattern
    Format { field: String, pattern: FormatPattern },

    /// A boolean expression over the record holds
    BusinessLogic { expression: String },
}

/// A declarative data-quality rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Stable rule id, referenced by outcomes and audit events
    pub id: String,

    /// Human-readable rule name
    pub name: String,

    /// What the rule checks
    #[serde(flatten)]
    pub kind: RuleKind,

    /// Blocking behavior on failure
    pub severity: Severity,

    /// Message recorded when the rule fails
    pub message: String,

    /// Optional fix applied when an error-severity rule fails
    #[serde(default)]
    pub remediation: Option<AutoRemediation>,
}

impl ValidationRule {
    /// Check the rule is well-formed without evaluating it
    pub fn validate(&self) -> crate::Result<()> {
        if self.id.is_empty() {
            return Err(crate::QualityError::Config("rule id must be non-empty".into()));
        }
        match &self.kind {
            RuleKind::Accuracy { field, min, max } => {
                if min.is_none() && max.is_none() {
                    return Err(crate::QualityError::Config(format!(
                        "accuracy rule '{}' on '{}' needs min or max",
                        self.id, field
                    )));
                }
            }
            RuleKind::BusinessLogic { expression } => {
                Expr::parse(expression).map_err(|e| {
                    crate::QualityError::Config(format!(
                        "business_logic rule '{}': {}",
                        self.id, e
                    ))
                })?;
            }
            RuleKind::Completeness { .. }
            | RuleKind::Consistency { .. }
            | RuleKind::Format { .. } => {}
        }
        if let Some(remediation) = &self.remediation {
            remediation.validate().map_err(|e| {
                crate::QualityError::Config(format!("rule '{}': {}", self.id, e))
            })?;
        }
        Ok(())
    }
}
