//! Background coordination process for peared.
//!
//! The daemon discovers the adapters present on the host, selects the one it
//! should manage and then waits for shutdown. Adapter lifecycle management is
//! not implemented yet; the daemon only reports what it would manage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod daemon;
pub mod error;

pub use daemon::{Daemon, DaemonOptions};
pub use error::{DaemonError, Result};
