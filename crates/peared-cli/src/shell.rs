//! Interactive shell.
//!
//! The shell is a small line-oriented control loop. A background task reads
//! one line at a time and hands it to the loop through a single-slot
//! channel, while the loop waits on both that channel and the caller's
//! [`Cancellation`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──run──▶ Running ──▶ Exited | Failed
//! ```
//!
//! A shell runs once. Calling [`Shell::run`] again, even concurrently, fails
//! with [`ShellError::AlreadyClosed`].
//!
//! # Input
//!
//! Commands are matched case-insensitively after trimming. A blank line or a
//! lone `#` does nothing. A final line that ends at end of input without a
//! newline still runs as a command before the shell exits.
//!
//! # Cancellation
//!
//! When the cancellation fires the loop returns immediately. The reader task
//! is abandoned rather than stopped: a read that is already blocked on the
//! input stream stays outstanding until the stream yields or is closed.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use peared_core::{CancelReason, Cancellation};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Prompt shown before each line when none is configured.
pub const DEFAULT_PROMPT: &str = "peared> ";

const WELCOME: &str = "Welcome to the Peared shell! Type 'help' to see available commands.\n";
const FAREWELL: &str = "Goodbye!\n";
const HELP: &str = "\
Available commands:
  help  - show this message
  exit  - leave the shell
  quit  - alias for exit
";

/// Errors that end a shell session.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The shell has already been run.
    #[error("shell already closed")]
    AlreadyClosed,

    /// The session was cancelled before the user exited.
    #[error(transparent)]
    Cancelled(#[from] CancelReason),

    /// Reading the input stream failed.
    #[error("read input: {0}")]
    Input(#[source] io::Error),

    /// Writing to the output stream failed.
    #[error("write output: {0}")]
    Output(#[source] io::Error),
}

/// Where a shell is in its single-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Constructed and not yet run.
    Idle,
    /// Inside [`Shell::run`].
    Running,
    /// Finished without error.
    Exited,
    /// Finished with an error or cancellation.
    Failed,
}

impl ShellState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Exited,
            _ => Self::Failed,
        }
    }
}

/// What the reader task hands to the control loop.
enum Input {
    Line(String),
    Eof,
    Failed(io::Error),
}

/// A minimal interactive prompt.
pub struct Shell<R, W> {
    reader: Mutex<Option<R>>,
    writer: tokio::sync::Mutex<W>,
    prompt: String,
    state: AtomicU8,
}

impl<R, W> Shell<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a shell reading commands from `reader` and writing to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            writer: tokio::sync::Mutex::new(writer),
            prompt: DEFAULT_PROMPT.to_string(),
            state: AtomicU8::new(ShellState::Idle as u8),
        }
    }

    /// Replace the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ShellState {
        ShellState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Consume the shell and return its output stream.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    /// Run the loop until the user exits, input ends or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::AlreadyClosed`] if the shell has been run
    /// before, the cancellation reason if `cancel` fires first, and an I/O
    /// error if reading or writing fails.
    pub async fn run(&self, cancel: &Cancellation) -> Result<(), ShellError> {
        if self
            .state
            .compare_exchange(
                ShellState::Idle as u8,
                ShellState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(ShellError::AlreadyClosed);
        }

        let result = self.run_loop(cancel).await;
        let end = if result.is_ok() {
            ShellState::Exited
        } else {
            ShellState::Failed
        };
        self.state.store(end as u8, Ordering::Release);

        result
    }

    async fn run_loop(&self, cancel: &Cancellation) -> Result<(), ShellError> {
        let reader = self.reader.lock().take().ok_or(ShellError::AlreadyClosed)?;
        let mut out = self.writer.lock().await;

        emit(&mut *out, WELCOME).await?;

        let (tx, mut rx) = mpsc::channel(1);
        tokio::spawn(read_lines(reader, tx, cancel.clone()));

        loop {
            emit(&mut *out, &self.prompt).await?;

            let input = tokio::select! {
                biased;
                reason = cancel.cancelled() => return Err(ShellError::Cancelled(reason)),
                input = rx.recv() => input.unwrap_or(Input::Eof),
            };

            let line = match input {
                Input::Line(line) => line,
                Input::Eof => {
                    emit(&mut *out, "\n").await?;
                    return Ok(());
                }
                Input::Failed(err) => return Err(ShellError::Input(err)),
            };

            let command = line.trim();
            match command.to_lowercase().as_str() {
                "" | "#" => {}
                "exit" | "quit" => {
                    emit(&mut *out, FAREWELL).await?;
                    return Ok(());
                }
                "help" => emit(&mut *out, HELP).await?,
                _ => {
                    tracing::debug!(command, "Unknown shell command");
                    emit(&mut *out, &format!("Unknown command: {command}\n")).await?;
                }
            }
        }
    }
}

impl<R, W> std::fmt::Debug for Shell<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("prompt", &self.prompt)
            .field("state", &ShellState::from_u8(self.state.load(Ordering::Acquire)))
            .finish_non_exhaustive()
    }
}

async fn emit<W>(out: &mut W, text: &str) -> Result<(), ShellError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    out.write_all(text.as_bytes())
        .await
        .map_err(ShellError::Output)?;
    out.flush().await.map_err(ShellError::Output)
}

/// Feed lines to the control loop until input ends, fails or the loop goes
/// away.
async fn read_lines<R>(reader: R, tx: mpsc::Sender<Input>, cancel: Cancellation)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    loop {
        let mut line = String::new();
        let input = match reader.read_line(&mut line).await {
            Ok(0) => Input::Eof,
            Ok(_) => Input::Line(line),
            Err(err) => Input::Failed(err),
        };
        let last = !matches!(input, Input::Line(_));

        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = tx.send(input) => {
                if sent.is_err() {
                    return;
                }
            }
        }

        if last {
            return;
        }
    }
}
