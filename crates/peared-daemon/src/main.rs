//! peared daemon entry point.
//!
//! Resolves configuration, selects an adapter and runs until SIGINT or
//! SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use peared_core::logging::level_directive;
use peared_core::{cancel_on_shutdown_signal, Cancellation, Config, SysfsAdapterProvider};
use peared_daemon::{Daemon, DaemonOptions};
use tracing_subscriber::EnvFilter;

/// peared daemon.
#[derive(Parser, Debug)]
#[command(name = "pearedd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Preferred adapter name or MAC address to prioritize.
    #[arg(long)]
    adapter: Option<String>,

    /// Path to configuration file (defaults to the XDG config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level_directive(&args.log_level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    let preferred_adapter = args
        .adapter
        .filter(|adapter| !adapter.trim().is_empty())
        .unwrap_or_else(|| config.daemon.preferred_adapter.clone());

    let daemon = Daemon::new(DaemonOptions {
        preferred_adapter,
        provider: Some(Arc::new(SysfsAdapterProvider::default())),
        config_source: config.source.clone(),
        config_loaded: config.loaded,
    });

    let cancel = Cancellation::new();
    cancel_on_shutdown_signal(&cancel);

    daemon.run(&cancel).await.context("daemon exited with error")?;
    Ok(())
}
