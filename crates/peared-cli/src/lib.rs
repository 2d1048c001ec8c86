//! Command line front-end for peared.
//!
//! The `peared` binary lives in `main.rs`; this library holds the pieces
//! that are useful on their own:
//!
//! - [`shell`]: the cancellable interactive prompt
//! - [`duration`]: human friendly duration flags

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod duration;
pub mod shell;

pub use duration::{format_duration, parse_duration, InvalidDuration};
pub use shell::{Shell, ShellError, ShellState, DEFAULT_PROMPT};
