//! tailwatch-daemon -- log file alerting daemon.
//!
//! Tails one log file, filters and deduplicates matching entries, and
//! forwards them to the console or a chat webhook. The configuration file is
//! checked for changes while running and applied without a restart.

use std::process::ExitCode;
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Parser;

use tailwatch_core::config::WatchConfig;
use tailwatch_daemon::cli::DaemonCli;
use tailwatch_daemon::logging;
use tailwatch_daemon::orchestrator::Orchestrator;
use tailwatch_pipeline::PipelineSnapshot;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tailwatch-daemon: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = WatchConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    cli.apply_overrides(&mut config.general);
    config.validate().context("invalid command-line override")?;

    if cli.validate {
        // Compiles patterns and constructs the sink without sending anything.
        PipelineSnapshot::build(config, SystemTime::now())
            .context("configuration failed pipeline validation")?;
        println!("configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "tailwatch-daemon starting"
    );

    let mut orchestrator = Orchestrator::build(&cli.config, config.general).await?;
    orchestrator.run().await
}
