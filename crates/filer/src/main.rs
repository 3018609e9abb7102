//! Filer - Automated regulatory reporting pipeline
//!
//! # Usage
//!
//! ```bash
//! # Run the scheduler daemon
//! filer serve --config configs/filer.toml
//!
//! # Execute one report now
//! filer run --config configs/filer.toml --report osfi_monthly
//!
//! # Validate configuration
//! filer check --config configs/filer.toml
//!
//! # Probe connector health
//! filer probe --config configs/filer.toml
//! filer probe --config configs/filer.toml --connector kri_logs
//!
//! # Fire a webhook test payload
//! filer webhook-test --url https://hooks.example/compliance
//! ```

mod cmd;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filer - Automated regulatory reporting pipeline
#[derive(Parser, Debug)]
#[command(name = "filer")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, default_value = "configs/filer.toml", global = true)]
    config: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and health monitor until interrupted
    Serve,

    /// Execute one pipeline run now
    Run(cmd::run::RunArgs),

    /// Load and validate the configuration
    Check,

    /// Probe connector health once
    Probe(cmd::probe::ProbeArgs),

    /// Fire a webhook test payload
    WebhookTest(cmd::webhook::WebhookArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Serve => cmd::serve::run(&cli.config).await,
        Command::Run(args) => cmd::run::run(&cli.config, args).await,
        Command::Check => cmd::check::run(&cli.config),
        Command::Probe(args) => cmd::probe::run(&cli.config, args).await,
        Command::WebhookTest(args) => cmd::webhook::run(&cli.config, args).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
