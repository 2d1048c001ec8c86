//! bluetoothctl command runner for peared.
//!
//! peared never speaks the Bluetooth protocol itself. Pairing, connection and
//! scanning are delegated to `bluetoothctl`; this crate decides how to invoke
//! it, with which privileges and against which adapter, and turns failures
//! into structured errors that keep the tool's own diagnostics.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use peared_bluetoothctl::Runner;
//! use peared_core::Cancellation;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Runner::builder().adapter("hci1").build()?;
//! let cancel = Cancellation::new();
//!
//! let devices = runner.scan(&cancel, Duration::from_secs(10)).await?;
//! println!("{devices}");
//!
//! runner.pair(&cancel, "AA:BB:CC:DD:EE:FF").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Privilege escalation
//!
//! Unless told otherwise, a runner started by a non-root user invokes
//! `sudo bluetoothctl ...`. If escalation is needed but `sudo` cannot be
//! found, [`RunnerBuilder::build`] fails instead of deferring the problem to
//! the first command.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod exec;
pub mod lookup;
pub mod privilege;
pub mod runner;

pub use error::{BluetoothctlError, CommandError, ExecCause, Result};
pub use exec::{CommandExecutor, ExecFailure, TokioExecutor};
pub use lookup::find_executable;
pub use privilege::{FixedUid, PrivilegeProbe, ProcStatusProbe};
pub use runner::{
    Runner, RunnerBuilder, RunnerConfig, CONTROL_TOOL, DEFAULT_SCAN_DURATION, ESCALATION_TOOL,
};
