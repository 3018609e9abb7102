//! `filer run` - execute one pipeline run now

use crate::context;
use anyhow::{bail, Result};
use clap::Args;
use filer_pipeline::RunPipeline;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Arguments for `filer run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Report configuration id to execute
    #[arg(short, long)]
    pub report: String,
}

/// Execute one run of the named report configuration
pub async fn run(config_path: &Path, args: RunArgs) -> Result<()> {
    let ctx = context::build(config_path)?;

    let Some(report_config) = ctx.config.reports.get(&args.report) else {
        bail!("unknown report '{}'", args.report);
    };

    let outcome = ctx
        .runner
        .run(&args.report, report_config, CancellationToken::new())
        .await?;

    info!(
        instance = %outcome.instance_id,
        status = ?outcome.status,
        submissions = outcome.submissions.len(),
        "run complete"
    );

    for warning in &outcome.warnings {
        info!(warning = %warning, "run warning");
    }
    for error in &outcome.errors {
        info!(error = %error, "run error");
    }

    println!(
        "{}",
        serde_json::json!({
            "instance": outcome.instance_id,
            "status": format!("{:?}", outcome.status),
            "warnings": outcome.warnings,
            "errors": outcome.errors,
        })
    );
    Ok(())
}
