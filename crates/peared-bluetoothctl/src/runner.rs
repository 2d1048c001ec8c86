//! The bluetoothctl runner.
//!
//! A [`Runner`] is built once from a [`RunnerBuilder`], which resolves the
//! binaries and escalation policy into an immutable [`RunnerConfig`]. Every
//! operation then becomes one or two subprocess invocations:
//!
//! ```text
//! [sudo] bluetoothctl select <adapter>     (only when an adapter is targeted)
//! [sudo] bluetoothctl <operation args>
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use peared_core::Cancellation;

use crate::error::{BluetoothctlError, CommandError, Result};
use crate::exec::{CommandExecutor, TokioExecutor};
use crate::lookup::find_executable;
use crate::privilege::{PrivilegeProbe, ProcStatusProbe};

/// Name of the control tool looked up on `PATH`.
pub const CONTROL_TOOL: &str = "bluetoothctl";

/// Name of the escalation tool looked up on `PATH`.
pub const ESCALATION_TOOL: &str = "sudo";

/// Scan window used when a non-positive duration is requested.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(15);

/// Resolved runner settings. Immutable once the runner is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Path to the bluetoothctl executable.
    pub binary: PathBuf,
    /// Path to the escalation executable, if one was found.
    pub escalation_binary: Option<PathBuf>,
    /// Whether commands run through the escalation binary.
    pub use_escalation: bool,
    /// Adapter every command targets. `None` defers to bluetoothctl's default.
    pub adapter: Option<String>,
}

#[derive(Debug, Default)]
enum EscalationSource {
    #[default]
    Lookup,
    Path(PathBuf),
    Absent,
}

/// Builds a [`Runner`].
#[derive(Default)]
pub struct RunnerBuilder {
    binary: Option<PathBuf>,
    escalation: EscalationSource,
    use_escalation: Option<bool>,
    adapter: Option<String>,
    executor: Option<Arc<dyn CommandExecutor>>,
    privilege: Option<Arc<dyn PrivilegeProbe>>,
    search_path: Option<OsString>,
}

impl RunnerBuilder {
    /// Use `path` as the bluetoothctl binary instead of searching `PATH`.
    /// An empty path keeps the lookup.
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.binary = (!path.as_os_str().is_empty()).then_some(path);
        self
    }

    /// Use `path` as the escalation binary instead of searching `PATH`.
    /// An empty path means no escalation binary is available.
    #[must_use]
    pub fn escalation_binary(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.escalation = if path.as_os_str().is_empty() {
            EscalationSource::Absent
        } else {
            EscalationSource::Path(path)
        };
        self
    }

    /// Skip the escalation binary lookup entirely.
    #[must_use]
    pub fn no_escalation_binary(mut self) -> Self {
        self.escalation = EscalationSource::Absent;
        self
    }

    /// Force escalation on or off instead of deriving it from the
    /// effective uid.
    #[must_use]
    pub const fn use_escalation(mut self, enabled: bool) -> Self {
        self.use_escalation = Some(enabled);
        self
    }

    /// Target `adapter` in every command. Blank identifiers are ignored.
    #[must_use]
    pub fn adapter(mut self, adapter: impl AsRef<str>) -> Self {
        let adapter = adapter.as_ref().trim();
        self.adapter = (!adapter.is_empty()).then(|| adapter.to_string());
        self
    }

    /// Replace the process execution primitive.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Replace the effective uid probe used to derive the escalation policy.
    #[must_use]
    pub fn privilege_probe(mut self, probe: Arc<dyn PrivilegeProbe>) -> Self {
        self.privilege = Some(probe);
        self
    }

    /// Search `paths` instead of `$PATH` when looking up binaries.
    #[must_use]
    pub fn search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    /// Resolve binaries and the escalation policy.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::BinaryNotFound`] when bluetoothctl cannot
    /// be located and [`BluetoothctlError::EscalationUnavailable`] when
    /// escalation is required but no escalation binary is available.
    pub fn build(self) -> Result<Runner> {
        let search_path = self.search_path.as_deref();

        let binary = match self.binary {
            Some(path) => path,
            None => find_executable(CONTROL_TOOL, search_path).ok_or_else(|| {
                BluetoothctlError::BinaryNotFound {
                    binary: CONTROL_TOOL.to_string(),
                }
            })?,
        };

        let escalation_binary = match self.escalation {
            EscalationSource::Lookup => find_executable(ESCALATION_TOOL, search_path),
            EscalationSource::Path(path) => Some(path),
            EscalationSource::Absent => None,
        };

        let use_escalation = self.use_escalation.unwrap_or_else(|| {
            let probe = self
                .privilege
                .unwrap_or_else(|| Arc::new(ProcStatusProbe));
            !probe.is_privileged()
        });

        if use_escalation && escalation_binary.is_none() {
            return Err(BluetoothctlError::EscalationUnavailable);
        }

        let config = RunnerConfig {
            binary,
            escalation_binary,
            use_escalation,
            adapter: self.adapter,
        };
        tracing::debug!(?config, "Configured bluetoothctl runner");

        Ok(Runner {
            config,
            executor: self.executor.unwrap_or_else(|| Arc::new(TokioExecutor)),
        })
    }
}

/// Executes bluetoothctl operations.
pub struct Runner {
    config: RunnerConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl Runner {
    /// Start building a runner.
    #[must_use]
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::default()
    }

    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Enable discovery for `duration` and return bluetoothctl's output.
    ///
    /// A zero duration scans for [`DEFAULT_SCAN_DURATION`]. Durations are
    /// rounded down to whole seconds with a floor of one second.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::Command`] when bluetoothctl fails.
    pub async fn scan(&self, cancel: &Cancellation, duration: Duration) -> Result<String> {
        let args = vec![
            "--timeout".to_string(),
            scan_seconds(duration).to_string(),
            "scan".to_string(),
            "on".to_string(),
        ];
        let output = self.exec(cancel, &args).await?;
        Ok(output.trim().to_string())
    }

    /// Pair with the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::AddressRequired`] for a blank address
    /// and [`BluetoothctlError::Command`] when bluetoothctl fails.
    pub async fn pair(&self, cancel: &Cancellation, address: &str) -> Result<String> {
        self.device_command(cancel, "pair", address).await
    }

    /// Connect to the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::AddressRequired`] for a blank address
    /// and [`BluetoothctlError::Command`] when bluetoothctl fails.
    pub async fn connect(&self, cancel: &Cancellation, address: &str) -> Result<String> {
        self.device_command(cancel, "connect", address).await
    }

    /// Disconnect from the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::AddressRequired`] for a blank address
    /// and [`BluetoothctlError::Command`] when bluetoothctl fails.
    pub async fn disconnect(&self, cancel: &Cancellation, address: &str) -> Result<String> {
        self.device_command(cancel, "disconnect", address).await
    }

    async fn device_command(
        &self,
        cancel: &Cancellation,
        command: &'static str,
        address: &str,
    ) -> Result<String> {
        let address = address.trim();
        if address.is_empty() {
            return Err(BluetoothctlError::AddressRequired { command });
        }

        let args = vec![command.to_string(), address.to_string()];
        let output = self.exec(cancel, &args).await?;
        Ok(output.trim().to_string())
    }

    /// Run `args` against the configured adapter and return the raw output.
    ///
    /// When an adapter is targeted a `select <adapter>` invocation runs
    /// first and its output is joined to the operation's output with a
    /// newline.
    ///
    /// # Errors
    ///
    /// Returns [`BluetoothctlError::Command`] for the first invocation that
    /// fails; no output is returned in that case.
    pub async fn exec(&self, cancel: &Cancellation, args: &[String]) -> Result<String> {
        let mut output = String::new();

        if let Some(adapter) = &self.config.adapter {
            let selected = self
                .invoke(cancel, vec!["select".to_string(), adapter.clone()])
                .await?;
            output.push_str(selected.trim_end());
            output.push('\n');
        }

        output.push_str(&self.invoke(cancel, args.to_vec()).await?);
        Ok(output)
    }

    async fn invoke(&self, cancel: &Cancellation, args: Vec<String>) -> Result<String> {
        let (program, argv) = self.command_line(&args);
        tracing::debug!(program = %program.display(), args = ?argv, "Running bluetoothctl");

        match self.executor.run(cancel, program, &argv).await {
            Ok(output) => Ok(String::from_utf8_lossy(&output).into_owned()),
            Err(failure) => {
                tracing::debug!(args = ?args, cause = %failure.cause, "bluetoothctl failed");
                Err(CommandError {
                    args,
                    output: failure.output,
                    source: failure.cause,
                }
                .into())
            }
        }
    }

    /// The program to spawn and its argument vector.
    fn command_line(&self, args: &[String]) -> (&Path, Vec<String>) {
        match (&self.config.escalation_binary, self.config.use_escalation) {
            (Some(escalation), true) => {
                let mut argv = Vec::with_capacity(args.len() + 1);
                argv.push(self.config.binary.to_string_lossy().into_owned());
                argv.extend_from_slice(args);
                (escalation.as_path(), argv)
            }
            _ => (self.config.binary.as_path(), args.to_vec()),
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn scan_seconds(duration: Duration) -> u64 {
    let duration = if duration.is_zero() {
        DEFAULT_SCAN_DURATION
    } else {
        duration
    };
    duration.as_secs().max(1)
}
