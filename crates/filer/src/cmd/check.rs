//! `filer check` - configuration validation

use anyhow::{Context, Result};
use filer_config::Config;
use std::path::Path;

/// Load and validate the configuration, reporting what was found
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate().context("validating configuration")?;

    println!(
        "configuration ok: {} connector(s), {} report(s)",
        config.connectors.len(),
        config.reports.len()
    );
    for (id, report) in config.reports.iter() {
        println!(
            "  report '{}': {} mapping(s), schedule '{}', submission {}",
            id,
            report.mappings.len(),
            report.effective_schedule(),
            if report.submission.enabled { "enabled" } else { "disabled" },
        );
    }
    Ok(())
}
