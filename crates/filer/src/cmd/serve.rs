//! `filer serve` - scheduler daemon

use crate::context;
use anyhow::Result;
use filer_pipeline::RunPipeline;
use filer_scheduler::Scheduler;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the scheduler and health monitor until SIGINT
pub async fn run(config_path: &Path) -> Result<()> {
    let ctx = context::build(config_path)?;

    let cancel = CancellationToken::new();

    let scheduler = Scheduler::from_config(
        &ctx.config,
        Arc::clone(&ctx.runner) as Arc<dyn RunPipeline>,
        Arc::clone(&ctx.monitor),
        Arc::clone(&ctx.fetcher),
        Arc::clone(&ctx.registry),
        Arc::clone(&ctx.audit),
    )?;

    info!(
        connectors = ctx.registry.len(),
        reports = scheduler.report_count(),
        "filer starting"
    );

    let monitor_task = tokio::spawn(
        Arc::clone(&ctx.monitor).run(cancel.child_token()),
    );
    let scheduler_task = tokio::spawn(scheduler.run(cancel.child_token()));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    cancel.cancel();

    let _ = scheduler_task.await;
    let _ = monitor_task.await;
    info!("filer stopped");
    Ok(())
}
