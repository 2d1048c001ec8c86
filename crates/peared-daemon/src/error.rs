//! Error types for the daemon.

use peared_core::{CancelReason, CoreError};
use thiserror::Error;

/// A result type using `DaemonError`.
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Errors that stop the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Adapter discovery failed.
    #[error("list adapters: {0}")]
    ListAdapters(#[source] CoreError),

    /// Discovery succeeded but found no adapters.
    #[error("no adapters discovered")]
    NoAdaptersDiscovered,

    /// Adapter selection failed.
    #[error("select adapter: {0}")]
    Select(#[source] CoreError),

    /// The daemon was stopped for a reason other than a plain shutdown.
    #[error("daemon exiting due to cancellation: {0}")]
    Cancelled(#[from] CancelReason),
}

impl DaemonError {
    /// True when discovery failed because the sysfs root was unreadable.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::ListAdapters(err) if err.is_permission_denied())
    }
}
