//! Transformation rule definitions and ordered application

use crate::expr::Expr;
use crate::{Result, TransformError};
use chrono::{DateTime, NaiveDate, Utc};
use filer_record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named formatter applied by a format rule
///
/// The set is closed: an unknown formatter name in config fails at parse
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    /// Normalize a date value to ISO 8601 (RFC 3339, UTC)
    IsoDate,
    /// Coerce the value to a number
    Number,
    /// Uppercase a string value
    Uppercase,
    /// Lowercase a string value
    Lowercase,
}

/// One case of a conditional rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Condition expression; must evaluate to a boolean
    pub when: String,
    /// Value written to the target field when the condition holds
    pub value: Value,
}

/// A single field-level transformation rule
///
/// Rules apply in declaration order. Each rule writes exactly one target
/// field and reads from the working record, so later rules observe the
/// output of earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformationRule {
    /// Copy a source field to the target field verbatim
    Mapping {
        source_field: String,
        target_field: String,
    },

    /// Apply a named formatter to a source field
    Format {
        source_field: String,
        target_field: String,
        formatter: Formatter,
    },

    /// Evaluate an arithmetic expression over already-transformed fields
    Calculation {
        target_field: String,
        expression: String,
    },

    /// Select a value from ordered (condition, value) cases
    Conditional {
        target_field: String,
        cases: Vec<Case>,
        #[serde(default)]
        default: Option<Value>,
    },
}

impl TransformationRule {
    /// The field this rule writes
    pub fn target_field(&self) -> &str {
        match self {
            TransformationRule::Mapping { target_field, .. }
            | TransformationRule::Format { target_field, .. }
            | TransformationRule::Calculation { target_field, .. }
            | TransformationRule::Conditional { target_field, .. } => target_field,
        }
    }

    /// Check the rule is well-formed without applying it
    ///
    /// Used by config validation so bad expressions are rejected at load
    /// time rather than on the first pipeline run.
    pub fn validate(&self) -> Result<()> {
        match self {
            TransformationRule::Mapping { source_field, target_field }
            | TransformationRule::Format { source_field, target_field, .. } => {
                if source_field.is_empty() || target_field.is_empty() {
                    return Err(TransformError::Config(
                        "source_field and target_field must be non-empty".into(),
                    ));
                }
                Ok(())
            }
            TransformationRule::Calculation { target_field, expression } => {
                Expr::parse(expression).map_err(|e| {
                    TransformError::Config(format!(
                        "calculation for '{}': {}",
                        target_field, e
                    ))
                })?;
                Ok(())
            }
            TransformationRule::Conditional { target_field, cases, .. } => {
                if cases.is_empty() {
                    return Err(TransformError::Config(format!(
                        "conditional for '{}' has no cases",
                        target_field
                    )));
                }
                for case in cases {
                    Expr::parse(&case.when).map_err(|e| {
                        TransformError::Config(format!(
                            "conditional for '{}': {}",
                            target_field, e
                        ))
                    })?;
                }
                Ok(())
            }
        }
    }

    /// Apply this rule to the working record in place
    fn apply_to(&self, record: &mut Record) -> Result<()> {
        match self {
            TransformationRule::Mapping { source_field, target_field } => {
                let value = record.get(source_field).cloned().unwrap_or(Value::Null);
                record.set(target_field.clone(), value);
                Ok(())
            }
            TransformationRule::Format { source_field, target_field, formatter } => {
                let source = record.get(source_field).cloned().unwrap_or(Value::Null);
                let formatted = run_formatter(*formatter, source_field, &source)?;
                record.set(target_field.clone(), formatted);
                Ok(())
            }
            TransformationRule::Calculation { target_field, expression } => {
                let expr = Expr::parse(expression).map_err(|e| TransformError::Calculation {
                    target_field: target_field.clone(),
                    message: e.to_string(),
                })?;
                let value = expr.eval(record).map_err(|e| TransformError::Calculation {
                    target_field: target_field.clone(),
                    message: e.to_string(),
                })?;
                record.set(target_field.clone(), value.into_json());
                Ok(())
            }
            TransformationRule::Conditional { target_field, cases, default } => {
                for case in cases {
                    let expr = Expr::parse(&case.when).map_err(|e| {
                        TransformError::Calculation {
                            target_field: target_field.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    let matched = expr
                        .eval(record)
                        .and_then(|v| v.truthy())
                        .map_err(|e| TransformError::Calculation {
                            target_field: target_field.clone(),
                            message: e.to_string(),
                        })?;
                    if matched {
                        record.set(target_field.clone(), case.value.clone());
                        return Ok(());
                    }
                }
                match default {
                    Some(value) => {
                        record.set(target_field.clone(), value.clone());
                        Ok(())
                    }
                    None => Err(TransformError::NoMatchingCondition {
                        target_field: target_field.clone(),
                    }),
                }
            }
        }
    }
}

/// Apply rules in declaration order, producing the transformed record
///
/// The input record is not modified; the returned record carries the
/// original fields plus every rule's target field. The first failing rule
/// aborts the record (the caller marks it invalid), never silently nulls.
pub fn apply(rules: &[TransformationRule], record: &Record) -> Result<Record> {
    let mut working = record.clone();
    for rule in rules {
        rule.apply_to(&mut working)?;
    }
    Ok(working)
}

fn run_formatter(formatter: Formatter, field: &str, value: &Value) -> Result<Value> {
    match formatter {
        Formatter::IsoDate => format_iso_date(field, value),
        Formatter::Number => match value {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| TransformError::Format {
                    field: field.to_string(),
                    message: format!("'{}' is not numeric", s),
                }),
            other => Err(TransformError::Format {
                field: field.to_string(),
                message: format!("cannot coerce {:?} to a number", other),
            }),
        },
        Formatter::Uppercase | Formatter::Lowercase => match value {
            Value::String(s) => Ok(Value::String(if formatter == Formatter::Uppercase {
                s.to_uppercase()
            } else {
                s.to_lowercase()
            })),
            other => Err(TransformError::Format {
                field: field.to_string(),
                message: format!("cannot case-convert {:?}", other),
            }),
        },
    }
}

/// Accepted input shapes: RFC 3339, `YYYY-MM-DD`, `YYYY/MM/DD`, or an
/// epoch-seconds number. Output is RFC 3339 in UTC.
fn format_iso_date(field: &str, value: &Value) -> Result<Value> {
    let formatted = match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                Some(dt.with_timezone(&Utc).to_rfc3339())
            } else {
                ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|t| t.and_utc().to_rfc3339())
            }
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339()),
        _ => None,
    };

    formatted.map(Value::String).ok_or_else(|| TransformError::Format {
        field: field.to_string(),
        message: format!("'{}' is not a recognized date", value),
    })
}

#[cfg(test)]
#[path = "rule_test.rs"]
mod tests;
