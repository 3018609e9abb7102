//! Rule evaluation and the remediation loop

use crate::remediation::LookupProvider;
use crate::rule::{CompareOp, FormatPattern, RuleKind, Severity, ValidationRule};
use chrono::{DateTime, NaiveDate};
use filer_record::Record;
use filer_transform::Expr;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one rule against one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Id of the evaluated rule
    pub rule_id: String,
    /// Name of the evaluated rule
    pub rule_name: String,
    /// Severity declared on the rule
    pub severity: Severity,
    /// Whether the rule passed (after remediation, if any)
    pub passed: bool,
    /// Failure detail; None when passed
    pub message: Option<String>,
    /// Whether a remediation fix was applied to reach this outcome
    pub remediated: bool,
}

/// Result of validating (and remediating) one record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// One outcome per rule, in rule order
    pub outcomes: Vec<RuleOutcome>,
    /// True when an error-severity rule stays failing
    pub blocked: bool,
    /// Number of rules resolved by remediation
    pub remediated: usize,
}

impl ValidationReport {
    /// Outcomes that failed, regardless of severity
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Count of failed outcomes at the given severity
    pub fn failed_at(&self, severity: Severity) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.passed && o.severity == severity)
            .count()
    }
}

/// Evaluate every rule against the record, without remediation
///
/// Rules run independently; one rule's failure never prevents evaluation
/// of the rest. An evaluation problem (missing field, type mismatch)
/// counts as a failure of that rule, with the detail in the message.
pub fn validate(record: &Record, rules: &[ValidationRule]) -> Vec<RuleOutcome> {
    rules
        .iter()
        .map(|rule| outcome_for(rule, record, false))
        .collect()
}

/// Validate, applying remediation to failing error-severity rules
///
/// Each failing error rule with a declared remediation gets exactly one
/// fix-and-revalidate attempt. A rule that still fails afterwards, or that
/// fails with no remediation, marks the report blocked.
pub async fn remediate_and_revalidate(
    record: &mut Record,
    rules: &[ValidationRule],
    lookup: &dyn LookupProvider,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for rule in rules {
        let first = outcome_for(rule, record, false);
        if first.passed {
            report.outcomes.push(first);
            continue;
        }

        if rule.severity != Severity::Error {
            report.outcomes.push(first);
            continue;
        }

        let Some(remediation) = &rule.remediation else {
            report.blocked = true;
            report.outcomes.push(first);
            continue;
        };

        match remediation.apply(record, lookup).await {
            Ok(()) => {
                let mut second = outcome_for(rule, record, true);
                if second.passed {
                    report.remediated += 1;
                } else {
                    report.blocked = true;
                    second.message = Some(
                        crate::QualityError::RemediationFailed {
                            rule: rule.id.clone(),
                        }
                        .to_string(),
                    );
                }
                report.outcomes.push(second);
            }
            Err(e) => {
                report.blocked = true;
                report.outcomes.push(RuleOutcome {
                    message: Some(format!("remediation failed: {}", e)),
                    ..first
                });
            }
        }
    }

    report
}

fn outcome_for(rule: &ValidationRule, record: &Record, remediated: bool) -> RuleOutcome {
    let (passed, detail) = match evaluate(&rule.kind, record) {
        Ok(true) => (true, None),
        Ok(false) => (false, Some(rule.message.clone())),
        Err(why) => (false, Some(format!("{}: {}", rule.message, why))),
    };

    RuleOutcome {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        severity: rule.severity,
        passed,
        message: detail,
        remediated: remediated && passed,
    }
}

fn evaluate(kind: &RuleKind, record: &Record) -> Result<bool, String> {
    match kind {
        RuleKind::Completeness { field } => Ok(record.has(field)),

        RuleKind::Accuracy { field, min, max } => {
            let value = record
                .number(field)
                .ok_or_else(|| format!("field '{}' is not numeric", field))?;
            let above_min = min.map_or(true, |m| value >= m);
            let below_max = max.map_or(true, |m| value <= m);
            Ok(above_min && below_max)
        }

        RuleKind::Consistency { field, op, other } => {
            compare_fields(record, field, *op, other)
        }

        RuleKind::Format { field, pattern } => {
            let Some(value) = record.get(field) else {
                return Ok(false);
            };
            Ok(matches_pattern(*pattern, value))
        }

        RuleKind::BusinessLogic { expression } => {
            let expr = Expr::parse(expression).map_err(|e| e.to_string())?;
            expr.eval(record)
                .and_then(|v| v.truthy())
                .map_err(|e| e.to_string())
        }
    }
}

fn compare_fields(
    record: &Record,
    field: &str,
    op: CompareOp,
    other: &str,
) -> Result<bool, String> {
    // Numeric comparison when both sides are numeric, string equality otherwise
    if let (Some(a), Some(b)) = (record.number(field), record.number(other)) {
        return Ok(match op {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        });
    }

    match (record.text(field), record.text(other)) {
        (Some(a), Some(b)) => match op {
            CompareOp::Eq => Ok(a == b),
            CompareOp::Ne => Ok(a != b),
            _ => Err(format!(
                "fields '{}' and '{}' are not numeric, only eq/ne apply",
                field, other
            )),
        },
        _ => Err(format!("fields '{}' and '{}' are not comparable", field, other)),
    }
}

fn matches_pattern(pattern: FormatPattern, value: &serde_json::Value) -> bool {
    match pattern {
        FormatPattern::IsoDate => value.as_str().is_some_and(|s| {
            DateTime::parse_from_rfc3339(s).is_ok()
                || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }),
        FormatPattern::Numeric => match value {
            serde_json::Value::Number(_) => true,
            serde_json::Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        },
        FormatPattern::Email => value.as_str().is_some_and(|s| {
            let mut parts = s.splitn(2, '@');
            let local = parts.next().unwrap_or("");
            let domain = parts.next().unwrap_or("");
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }),
        FormatPattern::NonEmpty => match value {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            serde_json::Value::Null => false,
            _ => true,
        },
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
