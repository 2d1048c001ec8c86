//! Error types for bluetoothctl invocations.

use std::borrow::Cow;
use std::io;

use peared_core::CancelReason;
use thiserror::Error;

/// A result type using `BluetoothctlError`.
pub type Result<T> = std::result::Result<T, BluetoothctlError>;

/// Errors that can occur while configuring or running bluetoothctl.
#[derive(Debug, Error)]
pub enum BluetoothctlError {
    /// A required binary could not be located on `PATH`.
    #[error("locate {binary}: executable file not found in PATH")]
    BinaryNotFound {
        /// Name of the missing binary.
        binary: String,
    },

    /// Escalation is required but no escalation binary is available.
    #[error(
        "sudo binary not found while privilege escalation is required; run the command as root or install sudo"
    )]
    EscalationUnavailable,

    /// A device command was issued with a blank address.
    #[error("device address required for {command}")]
    AddressRequired {
        /// The device command that was rejected.
        command: &'static str,
    },

    /// bluetoothctl ran and failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}

impl BluetoothctlError {
    /// The tool's captured output when the failure came from a subprocess.
    #[must_use]
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            Self::Command(err) => Some(&err.output),
            _ => None,
        }
    }
}

/// A failed bluetoothctl invocation.
///
/// `output` holds exactly the bytes the process wrote to stdout and stderr
/// so callers can show the tool's own diagnostics next to the error.
#[derive(Debug, Error)]
#[error("bluetoothctl {} failed: {source}", .args.join(" "))]
pub struct CommandError {
    /// The bluetoothctl arguments of the failed invocation.
    pub args: Vec<String>,
    /// Captured stdout followed by stderr.
    pub output: Vec<u8>,
    /// Why the invocation failed.
    pub source: ExecCause,
}

impl CommandError {
    /// The captured output as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Why a subprocess invocation failed.
#[derive(Debug, Error)]
pub enum ExecCause {
    /// The process could not be started.
    #[error("start process: {0}")]
    Spawn(#[source] io::Error),

    /// Waiting for the process or collecting its output failed.
    #[error("wait for process: {0}")]
    Wait(#[source] io::Error),

    /// The process exited with a non-zero status.
    #[error("exit status {0}")]
    Exit(i32),

    /// The process was terminated by a signal.
    #[error("terminated by signal")]
    Signal,

    /// The invocation was cancelled and the process killed.
    #[error(transparent)]
    Cancelled(#[from] CancelReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_names_arguments() {
        let err = CommandError {
            args: vec!["pair".into(), "AA:BB".into()],
            output: b"Failed to pair".to_vec(),
            source: ExecCause::Exit(1),
        };
        assert_eq!(err.to_string(), "bluetoothctl pair AA:BB failed: exit status 1");
    }

    #[test]
    fn output_only_for_command_failures() {
        let err = BluetoothctlError::from(CommandError {
            args: vec!["connect".into()],
            output: b"Device not available".to_vec(),
            source: ExecCause::Signal,
        });
        assert_eq!(err.output(), Some(&b"Device not available"[..]));
        assert_eq!(BluetoothctlError::EscalationUnavailable.output(), None);
    }
}
