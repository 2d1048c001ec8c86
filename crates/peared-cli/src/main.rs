//! peared CLI.
//!
//! This is the entry point for the `peared` binary.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use peared_cli::{parse_duration, DEFAULT_PROMPT};
use peared_core::logging::level_directive;
use peared_core::{cancel_on_shutdown_signal, Cancellation};
use tracing_subscriber::EnvFilter;

/// Manage Bluetooth adapters and devices from the terminal.
#[derive(Parser, Debug)]
#[command(name = "peared")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an interactive shell session.
    Shell {
        /// Prompt shown before each command.
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,
    },

    /// Inspect Bluetooth adapters available on the host.
    #[command(subcommand)]
    Adapters(AdaptersCommand),

    /// Manage Bluetooth devices (scan, pair, connect, disconnect).
    #[command(subcommand)]
    Devices(DevicesCommand),
}

#[derive(Subcommand, Debug)]
enum AdaptersCommand {
    /// List detected Bluetooth adapters.
    List {
        /// Override the sysfs adapter root.
        #[arg(long)]
        sysfs: Option<PathBuf>,

        /// Print adapters as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DevicesCommand {
    /// Scan for nearby devices.
    Scan {
        /// How long to scan (e.g. 10s, 1m).
        #[arg(long, default_value = "15s", value_parser = parse_duration)]
        duration: Duration,

        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Pair with a device.
    Pair(DeviceArgs),

    /// Connect to a device.
    Connect(DeviceArgs),

    /// Disconnect from a device.
    Disconnect(DeviceArgs),
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// Device MAC address.
    address: String,

    #[command(flatten)]
    runner: RunnerArgs,
}

/// Flags shared by every bluetoothctl-backed command.
#[derive(Args, Debug)]
struct RunnerArgs {
    /// Run bluetoothctl without sudo even when not root.
    #[arg(long)]
    no_sudo: bool,

    /// Adapter name or MAC address to target.
    #[arg(long)]
    adapter: Option<String>,

    /// Path to configuration file (defaults to the XDG config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level_directive(&cli.log_level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let cancel = Cancellation::new();
    cancel_on_shutdown_signal(&cancel);

    let result = match cli.command {
        Command::Shell { prompt } => commands::shell(&cancel, prompt).await,
        Command::Adapters(AdaptersCommand::List { sysfs, json }) => {
            commands::list_adapters(&cancel, sysfs, json)
        }
        Command::Devices(DevicesCommand::Scan { duration, runner }) => {
            commands::scan(&cancel, &runner, duration).await
        }
        Command::Devices(DevicesCommand::Pair(args)) => {
            commands::device(&cancel, &args.runner, commands::DeviceOp::Pair, &args.address).await
        }
        Command::Devices(DevicesCommand::Connect(args)) => {
            commands::device(&cancel, &args.runner, commands::DeviceOp::Connect, &args.address)
                .await
        }
        Command::Devices(DevicesCommand::Disconnect(args)) => {
            commands::device(
                &cancel,
                &args.runner,
                commands::DeviceOp::Disconnect,
                &args.address,
            )
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_defaults_to_fifteen_seconds() {
        let cli = Cli::try_parse_from(["peared", "devices", "scan"]).unwrap();
        match cli.command {
            Command::Devices(DevicesCommand::Scan { duration, runner }) => {
                assert_eq!(duration, Duration::from_secs(15));
                assert!(!runner.no_sudo);
                assert!(runner.adapter.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn device_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "peared",
            "devices",
            "pair",
            "AA:BB:CC:DD:EE:FF",
            "--no-sudo",
            "--adapter",
            "hci1",
        ])
        .unwrap();
        match cli.command {
            Command::Devices(DevicesCommand::Pair(args)) => {
                assert_eq!(args.address, "AA:BB:CC:DD:EE:FF");
                assert!(args.runner.no_sudo);
                assert_eq!(args.runner.adapter.as_deref(), Some("hci1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_address_is_a_usage_error() {
        let err = Cli::try_parse_from(["peared", "devices", "connect"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_duration_is_a_usage_error() {
        let err =
            Cli::try_parse_from(["peared", "devices", "scan", "--duration", "soon"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
