//! Common error types for peared.
//!
//! Discovery, selection and configuration failures share [`CoreError`].
//! Permission problems while reading the discovery root are reported as
//! [`CoreError::Access`] so front-ends can print targeted guidance.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cancel::CancelReason;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in adapter discovery, selection and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Adapter selection was asked to choose from an empty set.
    #[error("select adapter: no adapters supplied")]
    NoAdapters,

    /// The discovery root could not be read due to insufficient permissions.
    #[error(transparent)]
    Access(#[from] AdapterAccessError),

    /// The discovery root could not be read for any other reason.
    #[error("read sysfs adapters at {}: {source}", .path.display())]
    ReadAdapters {
        /// The discovery root.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// The operation observed a fired cancellation.
    #[error(transparent)]
    Cancelled(#[from] CancelReason),

    /// No user configuration directory is known on this platform.
    #[error("resolve config dir: no user configuration directory available")]
    ConfigDir,

    /// The configuration file exists but could not be read.
    #[error("read config {}: {source}", .path.display())]
    ConfigRead {
        /// The configuration path.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::Config`].
    #[error("decode config {}: {source}", .path.display())]
    ConfigDecode {
        /// The configuration path.
        path: PathBuf,
        /// The decoder failure.
        source: serde_yaml::Error,
    },
}

impl CoreError {
    /// Returns true when the failure was caused by missing filesystem permissions.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Access(_))
    }
}

/// The discovery root could not be listed because permission was denied.
///
/// The underlying [`io::Error`] is available through
/// [`std::error::Error::source`] and always has kind
/// [`io::ErrorKind::PermissionDenied`].
#[derive(Debug, Error)]
#[error("read sysfs adapters at {}: {source}", .path.display())]
pub struct AdapterAccessError {
    /// The discovery root that could not be read.
    pub path: PathBuf,
    /// The underlying permission failure.
    pub source: io::Error,
}
