//! Subprocess execution primitive.
//!
//! [`CommandExecutor`] is the seam between the runner and the operating
//! system. [`TokioExecutor`] is the production implementation; tests supply
//! scripted executors.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use peared_core::Cancellation;
use tokio::process::Command;

use crate::error::ExecCause;

/// A failed subprocess invocation along with whatever it printed.
#[derive(Debug)]
pub struct ExecFailure {
    /// Captured stdout followed by stderr. Empty if the process never ran.
    pub output: Vec<u8>,
    /// Why the invocation failed.
    pub cause: ExecCause,
}

impl ExecFailure {
    /// A failure that produced no output.
    #[must_use]
    pub const fn without_output(cause: ExecCause) -> Self {
        Self {
            output: Vec::new(),
            cause,
        }
    }
}

/// Runs external programs on behalf of the runner.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` and return its combined output.
    ///
    /// Implementations must terminate the child process when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecFailure`] when the process cannot be started, exits
    /// unsuccessfully or is cancelled.
    async fn run(
        &self,
        cancel: &Cancellation,
        program: &Path,
        args: &[String],
    ) -> Result<Vec<u8>, ExecFailure>;
}

/// Executes commands with [`tokio::process`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioExecutor;

#[async_trait]
impl CommandExecutor for TokioExecutor {
    async fn run(
        &self,
        cancel: &Cancellation,
        program: &Path,
        args: &[String],
    ) -> Result<Vec<u8>, ExecFailure> {
        if let Err(reason) = cancel.check() {
            return Err(ExecFailure::without_output(ExecCause::Cancelled(reason)));
        }

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecFailure::without_output(ExecCause::Spawn(e)))?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            reason = cancel.cancelled() => {
                return Err(ExecFailure::without_output(ExecCause::Cancelled(reason)));
            }
            output = child.wait_with_output() => {
                output.map_err(|e| ExecFailure::without_output(ExecCause::Wait(e)))?
            }
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            return Ok(combined);
        }

        let cause = output.status.code().map_or(ExecCause::Signal, ExecCause::Exit);
        Err(ExecFailure {
            output: combined,
            cause,
        })
    }
}
