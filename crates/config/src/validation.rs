//! Configuration validation
//!
//! Validates config consistency:
//! - Mappings reference declared connectors
//! - Transformation and validation rules are well-formed
//! - Schedules parse as cron expressions
//! - Submission targets carry endpoints
//! - Connectors have endpoints and sane timeouts

use crate::error::{ConfigError, Result};
use crate::Config;
use cron::Schedule;
use std::str::FromStr;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_connectors(config)?;
    validate_reports(config)?;
    Ok(())
}

fn validate_connectors(config: &Config) -> Result<()> {
    for (id, connector) in config.connectors.iter() {
        if connector.endpoint.is_empty() {
            return Err(ConfigError::missing_field("connector", id, "endpoint"));
        }
        if connector.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "connector",
                id,
                "timeout_secs",
                "must be greater than zero",
            ));
        }
        if let crate::SyncFrequency::Scheduled { schedule } = &connector.sync {
            check_schedule(id, schedule)?;
        }
    }
    Ok(())
}

fn validate_reports(config: &Config) -> Result<()> {
    for (id, report) in config.reports.iter() {
        if report.template_id.is_empty() {
            return Err(ConfigError::missing_field("report", id, "template_id"));
        }

        if let Some(schedule) = &report.schedule {
            check_schedule(id, schedule)?;
        }

        for mapping in &report.mappings {
            let Some(connector) = config.connectors.get(&mapping.source_id) else {
                return Err(ConfigError::unknown_connector(id, &mapping.source_id));
            };
            if connector.source_type != mapping.source_type {
                return Err(ConfigError::invalid_value(
                    "report",
                    id,
                    "source_type",
                    format!(
                        "mapping '{}' declares {} but connector '{}' is {}",
                        mapping.target_field,
                        mapping.source_type,
                        mapping.source_id,
                        connector.source_type
                    ),
                ));
            }

            for rule in &mapping.transforms {
                rule.validate().map_err(|e| ConfigError::InvalidTransform {
                    report: id.clone(),
                    mapping: mapping.target_field.clone(),
                    message: e.to_string(),
                })?;
            }

            for check in &mapping.checks {
                check.validate().map_err(|e| ConfigError::InvalidRule {
                    report: id.clone(),
                    message: e.to_string(),
                })?;
            }
        }

        for rule in &report.validations {
            rule.validate().map_err(|e| ConfigError::InvalidRule {
                report: id.clone(),
                message: e.to_string(),
            })?;
        }

        if report.submission.enabled {
            if report.submission.targets.is_empty() {
                return Err(ConfigError::missing_field("report", id, "submission.targets"));
            }
            for target in &report.submission.targets {
                if target.endpoint.is_empty() {
                    return Err(ConfigError::invalid_value(
                        "report",
                        id,
                        "submission",
                        format!("target {} has no endpoint", target.target.as_str()),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn check_schedule(name: &str, schedule: &str) -> Result<()> {
    Schedule::from_str(schedule).map_err(|e| ConfigError::InvalidSchedule {
        name: name.to_string(),
        schedule: schedule.to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}
