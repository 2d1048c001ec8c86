//! On-disk configuration.
//!
//! peared reads an optional YAML file:
//!
//! ```yaml
//! daemon:
//!   preferred_adapter: hci1
//! ```
//!
//! The file location is resolved from an explicit path, then the
//! [`CONFIG_ENV_VAR`] environment variable, then
//! `<user config dir>/peared/config.yaml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV_VAR: &str = "PEARED_CONFIG";

/// Configuration shared by the daemon and the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// The path the configuration was resolved to.
    #[serde(skip)]
    pub source: PathBuf,

    /// Whether a configuration file existed and was decoded.
    #[serde(skip)]
    pub loaded: bool,

    /// Daemon specific options.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Daemon options from the `daemon` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    /// Adapter id, address or alias to favour during selection.
    #[serde(default)]
    pub preferred_adapter: String,
}

impl Config {
    /// Resolve the configuration path and load it.
    ///
    /// # Errors
    ///
    /// See [`resolve_path`] and [`Config::load_from`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(resolve_path(explicit)?)
    }

    /// Load configuration from `path`. A missing file yields defaults with
    /// [`loaded`](Config::loaded) unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigRead`] when the file exists but cannot be
    /// read and [`CoreError::ConfigDecode`] when it is not valid YAML.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(Self {
                    source: path,
                    ..Self::default()
                });
            }
            Err(source) => return Err(CoreError::ConfigRead { path, source }),
        };

        let mut config = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(&data)
                .map_err(|source| CoreError::ConfigDecode {
                    path: path.clone(),
                    source,
                })?
        };

        config.source = path;
        config.loaded = true;
        Ok(config)
    }

    /// The configured preferred adapter, or `None` when blank.
    #[must_use]
    pub fn preferred_adapter(&self) -> Option<&str> {
        let preferred = self.daemon.preferred_adapter.trim();
        (!preferred.is_empty()).then_some(preferred)
    }
}

/// Determine the configuration path from the process environment.
///
/// # Errors
///
/// Returns [`CoreError::ConfigDir`] when neither an explicit path nor the
/// environment override is set and the platform has no config directory.
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_path_with(explicit, |key| std::env::var(key).ok(), dirs::config_dir)
}

/// Determine the configuration path using the supplied environment lookup
/// and config directory source.
///
/// # Errors
///
/// Returns [`CoreError::ConfigDir`] when no path can be derived.
pub fn resolve_path_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    config_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    config_dir()
        .map(|dir| dir.join("peared").join("config.yaml"))
        .ok_or(CoreError::ConfigDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_path_with(
            Some(Path::new("/etc/peared.yaml")),
            |_| Some("/env/config.yaml".into()),
            || Some(PathBuf::from("/home/user/.config")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/etc/peared.yaml"));
    }

    #[test]
    fn env_override_before_config_dir() {
        let path = resolve_path_with(
            None,
            |key| (key == CONFIG_ENV_VAR).then(|| "/env/config.yaml".to_string()),
            || Some(PathBuf::from("/home/user/.config")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/env/config.yaml"));
    }

    #[test]
    fn falls_back_to_config_dir() {
        let path = resolve_path_with(
            Some(Path::new("")),
            |_| Some(String::new()),
            || Some(PathBuf::from("/home/user/.config")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/home/user/.config/peared/config.yaml"));
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let result = resolve_path_with(None, |_| None, || None);
        assert!(matches!(result, Err(CoreError::ConfigDir)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::load_from(&path).unwrap();
        assert!(!config.loaded);
        assert_eq!(config.source, path);
        assert_eq!(config.preferred_adapter(), None);
    }

    #[test]
    fn decodes_preferred_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "daemon:\n  preferred_adapter: \" hci1 \"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(config.loaded);
        assert_eq!(config.source, path);
        assert_eq!(config.preferred_adapter(), Some("hci1"));
    }

    #[test]
    fn empty_file_is_loaded_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.loaded);
        assert_eq!(config.daemon.preferred_adapter, "");
    }

    #[test]
    fn malformed_yaml_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "daemon: [unterminated\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(CoreError::ConfigDecode { .. })));
    }
}
