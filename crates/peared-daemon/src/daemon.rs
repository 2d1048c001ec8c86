//! The daemon run loop.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use peared_core::{
    select_adapter, Adapter, AdapterProvider, Cancellation, SysfsAdapterProvider,
};

use crate::error::{DaemonError, Result};

/// Options for constructing a [`Daemon`].
#[derive(Default)]
pub struct DaemonOptions {
    /// Adapter id, address or alias to favour. Blank defers to automatic
    /// selection.
    pub preferred_adapter: String,

    /// Adapter discovery. Defaults to the sysfs provider.
    pub provider: Option<Arc<dyn AdapterProvider>>,

    /// Where configuration was resolved from. Reported in logs.
    pub config_source: PathBuf,

    /// Whether a configuration file was found on disk.
    pub config_loaded: bool,
}

/// The long-running peared process.
pub struct Daemon {
    preferred_adapter: String,
    provider: Arc<dyn AdapterProvider>,
    config_source: PathBuf,
    config_loaded: bool,
    active_adapter: RwLock<Option<Adapter>>,
}

impl Daemon {
    /// Create a daemon from `options`.
    #[must_use]
    pub fn new(options: DaemonOptions) -> Self {
        Self {
            preferred_adapter: options.preferred_adapter,
            provider: options
                .provider
                .unwrap_or_else(|| Arc::new(SysfsAdapterProvider::default())),
            config_source: options.config_source,
            config_loaded: options.config_loaded,
            active_adapter: RwLock::new(None),
        }
    }

    /// The adapter selected by the last successful [`run`](Self::run).
    #[must_use]
    pub fn active_adapter(&self) -> Option<Adapter> {
        self.active_adapter.read().clone()
    }

    /// Select an adapter and block until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns a discovery or selection error when no adapter can be chosen,
    /// and [`DaemonError::Cancelled`] when `cancel` fires with a specific
    /// reason. A plain cancellation is a clean shutdown.
    pub async fn run(&self, cancel: &Cancellation) -> Result<()> {
        self.refresh_adapters(cancel)?;

        let active = self
            .active_adapter()
            .map(|adapter| {
                if adapter.id.is_empty() {
                    adapter.address
                } else {
                    adapter.id
                }
            })
            .unwrap_or_default();

        tracing::info!(
            preferred_adapter = %self.preferred_adapter,
            config_source = %self.config_source.display(),
            config_loaded = self.config_loaded,
            active_adapter = %active,
            "Daemon started"
        );

        let reason = cancel.cancelled().await;
        if !reason.is_generic() {
            tracing::error!(error = %reason, "Daemon exiting due to cancellation");
            return Err(DaemonError::Cancelled(reason));
        }

        tracing::info!("Daemon stopped");
        Ok(())
    }

    fn refresh_adapters(&self, cancel: &Cancellation) -> Result<()> {
        let adapters = self
            .provider
            .list_adapters(cancel)
            .map_err(DaemonError::ListAdapters)?;

        if adapters.is_empty() {
            return Err(DaemonError::NoAdaptersDiscovered);
        }

        let preferred = Some(self.preferred_adapter.as_str());
        let chosen = select_adapter(preferred, &adapters).map_err(DaemonError::Select)?;

        tracing::debug!(
            id = %chosen.id,
            transport = %chosen.transport,
            discovered = adapters.len(),
            "Selected adapter"
        );
        *self.active_adapter.write() = Some(chosen.clone());
        Ok(())
    }
}
