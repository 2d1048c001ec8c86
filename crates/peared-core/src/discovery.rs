//! Adapter discovery from the Linux sysfs hierarchy.
//!
//! The kernel exposes one `hciN` entry per controller under
//! `/sys/class/bluetooth`. Each entry may carry `address`, `name` and
//! `powered` files plus a `device` link describing the bus the controller
//! hangs off. All of these are optional; missing files degrade to empty
//! values instead of failing discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::{Adapter, Transport};
use crate::cancel::Cancellation;
use crate::error::{AdapterAccessError, CoreError, Result};

/// The sysfs directory that lists Bluetooth controllers.
pub const DEFAULT_SYSFS_PATH: &str = "/sys/class/bluetooth";

const ADAPTER_PREFIX: &str = "hci";

/// Knows how to discover the adapters currently present on the system.
pub trait AdapterProvider: Send + Sync {
    /// Take a fresh snapshot of the available adapters.
    ///
    /// # Errors
    ///
    /// Implementations return [`CoreError::Cancelled`] when `cancel` fires
    /// during discovery and a discovery error when the system cannot be
    /// inspected.
    fn list_adapters(&self, cancel: &Cancellation) -> Result<Vec<Adapter>>;
}

/// Adapts a closure to [`AdapterProvider`].
pub struct ProviderFn<F>(F);

/// Wrap `f` so it can be used wherever an [`AdapterProvider`] is expected.
pub const fn provider_fn<F>(f: F) -> ProviderFn<F>
where
    F: Fn(&Cancellation) -> Result<Vec<Adapter>> + Send + Sync,
{
    ProviderFn(f)
}

impl<F> AdapterProvider for ProviderFn<F>
where
    F: Fn(&Cancellation) -> Result<Vec<Adapter>> + Send + Sync,
{
    fn list_adapters(&self, cancel: &Cancellation) -> Result<Vec<Adapter>> {
        (self.0)(cancel)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// The entry's file name.
    pub name: String,
    /// True for directories and for symlinks that resolve to a directory.
    pub is_dir: bool,
}

/// Lists directory contents for [`SysfsAdapterProvider`].
pub trait DirectoryReader: Send + Sync {
    /// List the entries of `path`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when `path` cannot be listed.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;
}

/// [`DirectoryReader`] backed by [`std::fs::read_dir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDirectoryReader;

impl DirectoryReader for StdDirectoryReader {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let is_dir = if file_type.is_symlink() {
                fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir())
            } else {
                file_type.is_dir()
            };

            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// The sysfs root used when no override is configured.
#[must_use]
pub fn default_sysfs_path() -> &'static Path {
    Path::new(DEFAULT_SYSFS_PATH)
}

/// Discovers adapters by inspecting a sysfs style directory tree.
#[derive(Clone)]
pub struct SysfsAdapterProvider {
    root: PathBuf,
    reader: Arc<dyn DirectoryReader>,
}

impl SysfsAdapterProvider {
    /// Create a provider rooted at `root`. An empty path selects
    /// [`DEFAULT_SYSFS_PATH`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_reader(root, Arc::new(StdDirectoryReader))
    }

    /// Create a provider that lists the root through `reader`.
    #[must_use]
    pub fn with_reader(root: impl Into<PathBuf>, reader: Arc<dyn DirectoryReader>) -> Self {
        let mut root = root.into();
        if root.as_os_str().is_empty() {
            root = default_sysfs_path().to_path_buf();
        }
        Self { root, reader }
    }

    /// The directory this provider enumerates.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_root(&self) -> Result<Vec<DirEntryInfo>> {
        self.reader.read_dir(&self.root).map_err(|source| {
            let path = self.root.clone();
            if source.kind() == io::ErrorKind::PermissionDenied {
                CoreError::Access(AdapterAccessError { path, source })
            } else {
                CoreError::ReadAdapters { path, source }
            }
        })
    }
}

impl Default for SysfsAdapterProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_PATH)
    }
}

impl std::fmt::Debug for SysfsAdapterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysfsAdapterProvider")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl AdapterProvider for SysfsAdapterProvider {
    fn list_adapters(&self, cancel: &Cancellation) -> Result<Vec<Adapter>> {
        let entries = self.read_root()?;

        let mut adapters = Vec::new();
        for entry in entries {
            cancel.check()?;

            if !entry.is_dir || !entry.name.starts_with(ADAPTER_PREFIX) {
                continue;
            }

            let adapter_path = self.root.join(&entry.name);
            let adapter = Adapter {
                address: read_trimmed(&adapter_path.join("address")),
                alias: read_trimmed(&adapter_path.join("name")),
                powered: parse_flag(&read_trimmed(&adapter_path.join("powered"))),
                transport: detect_transport(&adapter_path),
                id: entry.name,
            };

            tracing::debug!(
                id = %adapter.id,
                address = %adapter.address,
                transport = %adapter.transport,
                powered = adapter.powered,
                "Discovered adapter"
            );
            adapters.push(adapter);
        }

        Ok(adapters)
    }
}

/// Classify the bus an adapter is attached through.
///
/// The `device/modalias` prefix is authoritative when present; otherwise the
/// resolved `device` link target is searched for a bus segment.
fn detect_transport(adapter_path: &Path) -> Transport {
    let device = adapter_path.join("device");

    let modalias = read_trimmed(&device.join("modalias")).to_lowercase();
    if let Some(transport) = transport_from_modalias(&modalias) {
        return transport;
    }

    fs::canonicalize(&device)
        .ok()
        .and_then(|target| transport_from_device_path(&target.to_string_lossy().to_lowercase()))
        .unwrap_or(Transport::Unknown)
}

fn transport_from_modalias(modalias: &str) -> Option<Transport> {
    if modalias.starts_with("usb:") {
        Some(Transport::Usb)
    } else if modalias.starts_with("pci:") {
        Some(Transport::Pci)
    } else if modalias.starts_with("acpi:") || modalias.starts_with("platform:") {
        Some(Transport::Platform)
    } else {
        None
    }
}

fn transport_from_device_path(target: &str) -> Option<Transport> {
    if target.contains("/usb") {
        Some(Transport::Usb)
    } else if target.contains("/pci") {
        Some(Transport::Pci)
    } else if target.contains("/platform") || target.contains("/acpi") {
        Some(Transport::Platform)
    } else {
        None
    }
}

fn read_trimmed(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|data| data.trim().to_string())
        .unwrap_or_default()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes" | "y"
    )
}
