//! Aggregation across data source mappings
//!
//! For every mapping of a report configuration: fetch, transform,
//! validate-and-remediate. Source failures on non-required mappings are
//! recovered locally (zero-weighted, warning recorded); a required
//! mapping's failure fails the whole run.

use crate::{ReportError, Result};
use filer_config::ReportConfig;
use filer_connectors::Fetcher;
use filer_quality::{remediate_and_revalidate, LookupProvider, RuleKind, RuleOutcome};
use filer_record::{Record, ReportingPeriod};
use filer_transform::apply as apply_transforms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Quality sub-scores, each 0.0..=1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityScore {
    /// Fraction of completeness checks passing
    pub completeness: f64,
    /// Fraction of accuracy/format/business-logic checks passing,
    /// counting transform-invalid records as failures
    pub accuracy: f64,
    /// Fraction of consistency checks passing
    pub consistency: f64,
    /// Fraction of sources that delivered data
    pub timeliness: f64,
}

impl QualityScore {
    /// Arithmetic mean of the sub-scores, scaled to 0..=100
    pub fn overall(&self) -> f64 {
        (self.completeness + self.accuracy + self.consistency + self.timeliness) / 4.0 * 100.0
    }
}

/// Per-source outcome of one aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Connector id
    pub source_id: String,
    /// Report field the source feeds
    pub target_field: String,
    /// Whether the source delivered data
    pub available: bool,
    /// Raw records fetched
    pub fetched: usize,
    /// Records dropped by transform failures
    pub invalid: usize,
    /// Records blocked by unremediated error-severity rules
    pub blocked: usize,
    /// Per-source quality score (0..=100)
    pub quality: f64,
}

/// Result of aggregating one report configuration for one period
#[derive(Debug)]
pub struct AggregationResult {
    /// Period the aggregation covers
    pub period: ReportingPeriod,
    /// Per-source summaries, in mapping order
    pub sources: Vec<SourceSummary>,
    /// Transformed, unblocked records keyed by target field
    pub data: BTreeMap<String, Vec<Record>>,
    /// Validation outcomes across all records
    pub outcomes: Vec<RuleOutcome>,
    /// Warnings recorded during aggregation
    pub warnings: Vec<String>,
    /// Quality sub-scores
    pub quality: QualityScore,
    /// True when any record stays blocked after remediation
    pub blocked: bool,
}

/// Running tallies feeding the quality sub-scores
#[derive(Default)]
struct QualityTally {
    completeness_pass: usize,
    completeness_fail: usize,
    accuracy_pass: usize,
    accuracy_fail: usize,
    consistency_pass: usize,
    consistency_fail: usize,
    sources_total: usize,
    sources_available: usize,
}

impl QualityTally {
    fn record_outcome(&mut self, kind_of: &RuleKind, passed: bool) {
        let slot = match kind_of {
            RuleKind::Completeness { .. } => {
                (&mut self.completeness_pass, &mut self.completeness_fail)
            }
            RuleKind::Consistency { .. } => {
                (&mut self.consistency_pass, &mut self.consistency_fail)
            }
            RuleKind::Accuracy { .. }
            | RuleKind::Format { .. }
            | RuleKind::BusinessLogic { .. } => (&mut self.accuracy_pass, &mut self.accuracy_fail),
        };
        if passed {
            *slot.0 += 1;
        } else {
            *slot.1 += 1;
        }
    }

    fn score(&self) -> QualityScore {
        QualityScore {
            completeness: fraction(self.completeness_pass, self.completeness_fail),
            accuracy: fraction(self.accuracy_pass, self.accuracy_fail),
            consistency: fraction(self.consistency_pass, self.consistency_fail),
            timeliness: if self.sources_total == 0 {
                1.0
            } else {
                self.sources_available as f64 / self.sources_total as f64
            },
        }
    }
}

fn fraction(pass: usize, fail: usize) -> f64 {
    if pass + fail == 0 {
        1.0
    } else {
        pass as f64 / (pass + fail) as f64
    }
}

/// Orchestrates fetch, transform, and validation per mapping
pub struct Aggregator {
    fetcher: Arc<dyn Fetcher>,
    lookup: Arc<dyn LookupProvider>,
}

impl Aggregator {
    /// Create an aggregator
    pub fn new(fetcher: Arc<dyn Fetcher>, lookup: Arc<dyn LookupProvider>) -> Self {
        Self { fetcher, lookup }
    }

    /// Aggregate every mapping of the config for the period
    ///
    /// Cancellation is honored between sources and between stages; a
    /// cancelled aggregation returns `Cancelled` and its partial state is
    /// discarded by the caller.
    pub async fn aggregate(
        &self,
        config_id: &str,
        config: &ReportConfig,
        period: &ReportingPeriod,
        cancel: &CancellationToken,
    ) -> Result<AggregationResult> {
        let mut result = AggregationResult {
            period: *period,
            sources: Vec::with_capacity(config.mappings.len()),
            data: BTreeMap::new(),
            outcomes: Vec::new(),
            warnings: Vec::new(),
            quality: QualityScore {
                completeness: 1.0,
                accuracy: 1.0,
                consistency: 1.0,
                timeliness: 1.0,
            },
            blocked: false,
        };
        let mut tally = QualityTally::default();

        for mapping in &config.mappings {
            if cancel.is_cancelled() {
                return Err(ReportError::Cancelled);
            }
            tally.sources_total += 1;

            let records = match self.fetcher.fetch(mapping, period).await {
                Ok(records) => records,
                Err(cause) if mapping.required => {
                    return Err(ReportError::RequiredSourceFailed {
                        source: mapping.source_id.clone(),
                        cause,
                    });
                }
                Err(cause) => {
                    warn!(
                        report = %config_id,
                        source = %mapping.source_id,
                        error = %cause,
                        "source unavailable, zero-weighting"
                    );
                    result.warnings.push(format!(
                        "source '{}' unavailable: {}",
                        mapping.source_id, cause
                    ));
                    result.sources.push(SourceSummary {
                        source_id: mapping.source_id.clone(),
                        target_field: mapping.target_field.clone(),
                        available: false,
                        fetched: 0,
                        invalid: 0,
                        blocked: 0,
                        quality: 0.0,
                    });
                    result.data.insert(mapping.target_field.clone(), Vec::new());
                    continue;
                }
            };
            tally.sources_available += 1;

            if cancel.is_cancelled() {
                return Err(ReportError::Cancelled);
            }

            let fetched = records.len();
            let mut invalid = 0usize;
            let mut blocked = 0usize;
            let mut kept = Vec::with_capacity(fetched);

            // Mapping-level checks run before the report-level rules
            let rules: Vec<_> = mapping
                .checks
                .iter()
                .chain(config.validations.iter())
                .cloned()
                .collect();

            for record in records {
                // Transform failures mark the record invalid, never null
                let mut transformed = match apply_transforms(&mapping.transforms, &record) {
                    Ok(r) => r,
                    Err(e) => {
                        invalid += 1;
                        tally.accuracy_fail += 1;
                        result.warnings.push(format!(
                            "source '{}': record dropped: {}",
                            mapping.source_id, e
                        ));
                        continue;
                    }
                };

                if config.auto_validate {
                    let report =
                        remediate_and_revalidate(&mut transformed, &rules, self.lookup.as_ref())
                            .await;

                    for (outcome, rule) in report.outcomes.iter().zip(rules.iter()) {
                        tally.record_outcome(&rule.kind, outcome.passed);
                    }
                    let record_blocked = report.blocked;
                    result.outcomes.extend(report.outcomes);

                    if record_blocked {
                        blocked += 1;
                        result.blocked = true;
                        continue;
                    }
                }

                kept.push(transformed);
            }

            let quality = if fetched == 0 {
                100.0
            } else {
                (fetched - invalid - blocked) as f64 / fetched as f64 * 100.0
            };

            debug!(
                report = %config_id,
                source = %mapping.source_id,
                fetched,
                invalid,
                blocked,
                "source aggregated"
            );

            result.sources.push(SourceSummary {
                source_id: mapping.source_id.clone(),
                target_field: mapping.target_field.clone(),
                available: true,
                fetched,
                invalid,
                blocked,
                quality,
            });
            result
                .data
                .entry(mapping.target_field.clone())
                .or_default()
                .extend(kept);
        }

        if cancel.is_cancelled() {
            return Err(ReportError::Cancelled);
        }

        result.quality = tally.score();
        Ok(result)
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
