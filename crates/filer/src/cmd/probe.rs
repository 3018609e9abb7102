//! `filer probe` - one-shot health checks

use crate::context;
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Arguments for `filer probe`
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Probe a single connector instead of all
    #[arg(long)]
    pub connector: Option<String>,
}

/// Probe connector health once and print the results
pub async fn run(config_path: &Path, args: ProbeArgs) -> Result<()> {
    let ctx = context::build(config_path)?;

    let checks = match args.connector {
        Some(id) => vec![ctx.monitor.check_connector(&id).await?],
        None => ctx.monitor.sweep().await,
    };

    for check in &checks {
        println!(
            "{}: {:?} (connectivity={} auth={} data_flow={} {}ms)",
            check.connector_id,
            check.status,
            check.connectivity,
            check.authentication,
            check.data_flow,
            check.response_time_ms,
        );
    }

    let alerts = ctx.monitor.alerts().unresolved();
    if !alerts.is_empty() {
        println!("unresolved alerts:");
        for alert in alerts {
            println!("  [{:?}] {} - {}", alert.severity, alert.connector_id, alert.message);
        }
    }
    Ok(())
}
