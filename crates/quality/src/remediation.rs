//! Auto-remediation of failing validation rules

use crate::{QualityError, Result};
use async_trait::async_trait;
use filer_record::Record;
use filer_transform::Expr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fix applied to a record when an error-severity rule fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fix", rename_all = "snake_case")]
pub enum AutoRemediation {
    /// Write a fixed default value into the field
    DefaultValue { field: String, value: Value },

    /// Write the result of an expression over the record into the field
    Calculated { field: String, expression: String },

    /// Resolve the value through an external lookup provider
    Lookup { field: String, key: String },
}

impl AutoRemediation {
    /// Check the remediation is well-formed
    pub fn validate(&self) -> Result<()> {
        match self {
            AutoRemediation::Calculated { expression, .. } => {
                Expr::parse(expression).map_err(|e| {
                    QualityError::Config(format!("remediation expression: {}", e))
                })?;
                Ok(())
            }
            AutoRemediation::DefaultValue { field, .. }
            | AutoRemediation::Lookup { field, .. } => {
                if field.is_empty() {
                    return Err(QualityError::Config(
                        "remediation field must be non-empty".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Apply the fix to the record
    ///
    /// Lookup remediation is the only suspension point in validation; the
    /// provider call is awaited here and nowhere else.
    pub async fn apply(
        &self,
        record: &mut Record,
        lookup: &dyn LookupProvider,
    ) -> Result<()> {
        match self {
            AutoRemediation::DefaultValue { field, value } => {
                record.set(field.clone(), value.clone());
                Ok(())
            }
            AutoRemediation::Calculated { field, expression } => {
                let expr = Expr::parse(expression)
                    .map_err(|e| QualityError::Config(e.to_string()))?;
                let value = expr.eval(record).map_err(|e| QualityError::LookupFailed {
                    key: field.clone(),
                    message: e.to_string(),
                })?;
                record.set(field.clone(), value.into_json());
                Ok(())
            }
            AutoRemediation::Lookup { field, key } => {
                let value = lookup.lookup(key, record).await.map_err(|message| {
                    QualityError::LookupFailed { key: key.clone(), message }
                })?;
                match value {
                    Some(v) => {
                        record.set(field.clone(), v);
                        Ok(())
                    }
                    None => Err(QualityError::LookupFailed {
                        key: key.clone(),
                        message: "no value found".into(),
                    }),
                }
            }
        }
    }
}

/// External lookup source for remediation values
///
/// Implementations may call other services; the trait is async so the
/// validator can await without blocking a worker thread.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Resolve a remediation value for the given key and record
    ///
    /// Returns `Ok(None)` when the provider has no value; `Err` carries a
    /// provider-side failure message.
    async fn lookup(
        &self,
        key: &str,
        record: &Record,
    ) -> std::result::Result<Option<Value>, String>;
}

/// Provider that never resolves anything
///
/// Used where lookup remediation is not configured; any lookup fix fails
/// as `RemediationFailed` instead of being silently skipped.
pub struct NoLookup;

#[async_trait]
impl LookupProvider for NoLookup {
    async fn lookup(
        &self,
        _key: &str,
        _record: &Record,
    ) -> std::result::Result<Option<Value>, String> {
        Ok(None)
    }
}
