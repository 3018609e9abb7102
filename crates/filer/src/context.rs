//! Component wiring
//!
//! Builds the pipeline's collaborators from configuration. Used by every
//! command that needs more than config parsing.

use anyhow::{Context as _, Result};
use filer_config::{AuditSinkKind, Config, StoreKind};
use filer_connectors::{ConnectorRegistry, DataFetcher, Fetcher};
use filer_health::{HealthMonitor, HttpProber, ProbeClient};
use filer_pipeline::{
    AuditLog, FileAuditLog, LogNotifier, MemoryAuditLog, PipelineRunner,
};
use filer_quality::NoLookup;
use filer_report::{Aggregator, FileStore, MemoryStore, ReportStore};
use filer_submit::{HttpDeliveryClient, SubmissionEngine};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything a command needs, wired once
pub struct AppContext {
    pub config: Config,
    pub registry: Arc<ConnectorRegistry>,
    pub monitor: Arc<HealthMonitor>,
    pub fetcher: Arc<dyn Fetcher>,
    pub audit: Arc<dyn AuditLog>,
    pub runner: Arc<PipelineRunner>,
}

/// Load configuration and wire the component graph
pub fn build(config_path: &Path) -> Result<AppContext> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.validate().context("validating configuration")?;

    let registry = Arc::new(ConnectorRegistry::from_config(&config.connectors));

    let fetcher: Arc<dyn Fetcher> = Arc::new(
        DataFetcher::new(Arc::clone(&registry)).context("building data fetcher")?,
    );

    let store: Arc<dyn ReportStore> = match config.store.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => {
            let dir = config
                .store
                .path
                .as_deref()
                .unwrap_or("data/reports");
            Arc::new(FileStore::new(dir).context("opening report store")?)
        }
    };

    let audit: Arc<dyn AuditLog> = match config.audit.sink {
        AuditSinkKind::Memory => Arc::new(MemoryAuditLog::new()),
        AuditSinkKind::File => {
            let path = config
                .audit
                .path
                .as_deref()
                .unwrap_or("data/audit.jsonl");
            Arc::new(FileAuditLog::new(path).context("opening audit log")?)
        }
    };

    let prober: Arc<dyn ProbeClient> = Arc::new(
        HttpProber::new(Duration::from_secs(10)).context("building health prober")?,
    );
    let monitor = Arc::new(
        HealthMonitor::new(Arc::clone(&registry), prober, config.health.clone())
            .with_audit(Arc::clone(&audit)),
    );

    let aggregator = Aggregator::new(Arc::clone(&fetcher), Arc::new(NoLookup));
    let engine = SubmissionEngine::new(Arc::new(
        HttpDeliveryClient::new().context("building delivery client")?,
    ));

    let runner = Arc::new(PipelineRunner::new(
        aggregator,
        engine,
        store,
        Arc::clone(&audit),
        Arc::new(LogNotifier),
    ));

    Ok(AppContext {
        config,
        registry,
        monitor,
        fetcher,
        audit,
        runner,
    })
}
