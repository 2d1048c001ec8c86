//! Core types and utilities for peared.
//!
//! This crate provides the pieces every peared front-end builds on:
//!
//! - **Adapters**: the [`Adapter`] value type and the [`select_adapter`] policy
//! - **Discovery**: [`SysfsAdapterProvider`] which reads the kernel's Bluetooth
//!   class hierarchy
//! - **Cancellation**: a cloneable [`Cancellation`] token shared between tasks
//! - **Configuration**: the on-disk YAML [`Config`]
//!
//! # Example
//!
//! ```no_run
//! use peared_core::{select_adapter, AdapterProvider, Cancellation, SysfsAdapterProvider};
//!
//! let cancel = Cancellation::new();
//! let provider = SysfsAdapterProvider::default();
//! let adapters = provider.list_adapters(&cancel)?;
//! let chosen = select_adapter(Some("hci1"), &adapters)?;
//! println!("using {}", chosen.id);
//! # Ok::<(), peared_core::CoreError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod adapter;
pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;

pub use adapter::{select_adapter, Adapter, Transport};
pub use cancel::{cancel_on_shutdown_signal, CancelReason, Cancellation};
pub use config::{Config, DaemonConfig, CONFIG_ENV_VAR};
pub use discovery::{
    default_sysfs_path, provider_fn, AdapterProvider, DirEntryInfo, DirectoryReader, ProviderFn,
    StdDirectoryReader, SysfsAdapterProvider, DEFAULT_SYSFS_PATH,
};
pub use error::{AdapterAccessError, CoreError, Result};
