//! Subcommand handlers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use peared_bluetoothctl::{BluetoothctlError, Runner, DEFAULT_SCAN_DURATION};
use peared_cli::{format_duration, Shell, ShellError};
use peared_core::{
    select_adapter, AdapterProvider, Cancellation, Config, CoreError, SysfsAdapterProvider,
};

use crate::RunnerArgs;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// A single-device bluetoothctl operation.
#[derive(Debug, Clone, Copy)]
pub enum DeviceOp {
    Pair,
    Connect,
    Disconnect,
}

impl DeviceOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Run the interactive shell on stdin and stdout.
pub async fn shell(cancel: &Cancellation, prompt: String) -> anyhow::Result<()> {
    tracing::info!("Starting interactive shell");

    let shell = Shell::new(tokio::io::stdin(), tokio::io::stdout()).with_prompt(prompt);
    match shell.run(cancel).await {
        Ok(()) => Ok(()),
        Err(ShellError::Cancelled(reason)) => {
            tracing::info!(%reason, "Shell interrupted");
            Ok(())
        }
        Err(err) => Err(err).context("shell exited with error"),
    }
}

/// Print detected adapters, one per line or as JSON.
pub fn list_adapters(
    cancel: &Cancellation,
    sysfs: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let provider = SysfsAdapterProvider::new(sysfs.unwrap_or_default());

    let adapters = match provider.list_adapters(cancel) {
        Ok(adapters) => adapters,
        Err(err) if err.is_permission_denied() => {
            bail!(
                "insufficient permissions to read {}: {err}\n\
                 Run the command with elevated privileges (for example: sudo peared adapters list) \
                 or adjust the permissions of that directory",
                provider.root().display()
            );
        }
        Err(err) => return Err(err).context("failed to list adapters"),
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(&adapters).context("failed to encode adapters")?;
        println!("{rendered}");
        return Ok(());
    }

    if adapters.is_empty() {
        println!("No adapters detected.");
        return Ok(());
    }

    for adapter in &adapters {
        let alias = if adapter.alias.is_empty() {
            "(no alias)"
        } else {
            adapter.alias.as_str()
        };
        let power = if adapter.powered { "on" } else { "off" };
        println!("{}\t{}\t{alias}\t{power}", adapter.id, adapter.address);
    }
    Ok(())
}

/// Scan for devices, printing a progress dot every second.
pub async fn scan(
    cancel: &Cancellation,
    args: &RunnerArgs,
    duration: Duration,
) -> anyhow::Result<()> {
    let runner = build_runner(cancel, args)?;

    let effective = if duration.is_zero() {
        DEFAULT_SCAN_DURATION
    } else {
        duration
    };
    match &runner.config().adapter {
        Some(adapter) => eprint!(
            "Scanning on {adapter} for up to {}",
            format_duration(effective)
        ),
        None => eprint!("Scanning for up to {}", format_duration(effective)),
    }

    let progress = Cancellation::new();
    let dots = tokio::spawn(print_progress(progress.clone()));
    let result = runner.scan(cancel, duration).await;
    progress.cancel();
    if let Err(err) = dots.await {
        tracing::debug!(error = %err, "Progress task ended abnormally");
    }
    eprintln!();

    finish("scan", result)
}

/// Run a pair, connect or disconnect against one device address.
pub async fn device(
    cancel: &Cancellation,
    args: &RunnerArgs,
    op: DeviceOp,
    address: &str,
) -> anyhow::Result<()> {
    let runner = build_runner(cancel, args)?;
    let result = match op {
        DeviceOp::Pair => runner.pair(cancel, address).await,
        DeviceOp::Connect => runner.connect(cancel, address).await,
        DeviceOp::Disconnect => runner.disconnect(cancel, address).await,
    };
    finish(&format!("{} {address}", op.as_str()), result)
}

fn build_runner(cancel: &Cancellation, args: &RunnerArgs) -> anyhow::Result<Runner> {
    let adapter = determine_adapter(cancel, args.adapter.as_deref(), args.config.as_deref())
        .context("failed to determine adapter")?;
    tracing::debug!(%adapter, no_sudo = args.no_sudo, "Resolved target adapter");

    let mut builder = Runner::builder().adapter(adapter);
    if args.no_sudo {
        builder = builder.use_escalation(false);
    }
    builder.build().context("failed to set up bluetoothctl runner")
}

/// Pick the adapter to target: an explicit flag wins, otherwise the
/// configured preference is matched against discovered adapters.
fn determine_adapter(
    cancel: &Cancellation,
    explicit: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<String> {
    if let Some(adapter) = explicit.map(str::trim).filter(|a| !a.is_empty()) {
        return Ok(adapter.to_string());
    }

    let config = Config::load(config_path).context("load config")?;
    let adapters = SysfsAdapterProvider::default()
        .list_adapters(cancel)
        .context("discover adapters")?;
    let selected = select_adapter(config.preferred_adapter(), &adapters).map_err(|err| {
        match err {
            CoreError::NoAdapters => anyhow::anyhow!("no adapters detected"),
            other => other.into(),
        }
    })?;
    Ok(selected.id.clone())
}

fn finish(op: &str, result: Result<String, BluetoothctlError>) -> anyhow::Result<()> {
    match result {
        Ok(output) => {
            let output = output.trim();
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(err) => {
            if let Some(output) = err.output() {
                let output = String::from_utf8_lossy(output);
                let output = output.trim();
                if !output.is_empty() {
                    eprintln!("{output}");
                }
            }
            Err(err).context(format!("failed to execute {op}"))
        }
    }
}

async fn print_progress(done: Cancellation) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = done.cancelled() => return,
            _ = ticker.tick() => {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, ".");
                let _ = stderr.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_adapter_skips_discovery() {
        let adapter = determine_adapter(
            &Cancellation::new(),
            Some("  hci7 "),
            Some(Path::new("/nonexistent/peared/config.yaml")),
        )
        .unwrap();
        assert_eq!(adapter, "hci7");
    }

    #[test]
    fn device_ops_name_their_bluetoothctl_command() {
        assert_eq!(DeviceOp::Pair.as_str(), "pair");
        assert_eq!(DeviceOp::Connect.as_str(), "connect");
        assert_eq!(DeviceOp::Disconnect.as_str(), "disconnect");
    }

    #[tokio::test(start_paused = true)]
    async fn progress_stops_when_done() {
        let done = Cancellation::new();
        let handle = tokio::spawn(print_progress(done.clone()));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        done.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("progress task kept running")
            .unwrap();
    }
}
