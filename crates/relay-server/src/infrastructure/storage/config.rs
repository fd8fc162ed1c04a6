//! TOML-based configuration for the relay server.
//!
//! The config file is looked up in this order:
//!
//! 1. The path given as the first command-line argument.
//! 2. The path in the `KEY_RELAY_CONFIG` environment variable.
//! 3. The platform config directory:
//!    - Windows:  `%APPDATA%\KeyRelay\config.toml`
//!    - Linux:    `~/.config/key-relay/config.toml`
//!    - macOS:    `~/Library/Application Support/KeyRelay/config.toml`
//!
//! A missing file is not an error: the defaults describe a dry-run relay on
//! `0.0.0.0:5001` using the synthetic key-name preset.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 5001
//!
//! [backend]
//! kind = "raw_injection"
//! host = "192.168.2.188"
//! uuid = "33005C53"
//!
//! [keymap]
//! preset = "none"
//! [keymap.entries]
//! Up = 82
//! Down = 81
//! ```
//!
//! # Serde default values
//!
//! Every field carries a `#[serde(default ...)]`, so a partial file only
//! overrides what it names.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use relay_core::{AbstractKey, BackendToken, KeyMappingTable, MappingError, Preset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

/// Environment variable that overrides the platform config path.
pub const CONFIG_PATH_ENV: &str = "KEY_RELAY_CONFIG";

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The `[keymap]` section does not produce a usable table.
    #[error("invalid keymap: {0}")]
    Mapping(#[from] MappingError),

    /// A value is syntactically valid TOML but not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
}

/// gRPC listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on concurrently executing backend calls.  Ignored (forced
    /// to 1) for the focus-gated backend.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which backend the relay drives, with its backend-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Network HID injection device (kmbox-Net protocol).
    RawInjection {
        host: String,
        #[serde(default = "default_device_port")]
        port: u16,
        /// Device UUID: 8 hex digits printed on the device.
        uuid: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// OS keyboard synthesis gated on a target window's focus.
    FocusGated {
        #[serde(default)]
        window_class: Option<String>,
        #[serde(default)]
        window_title: Option<String>,
    },
    /// Log only.
    #[default]
    DryRun,
}

impl BackendConfig {
    /// The preset used when `[keymap] preset` is left at `auto`.
    pub fn default_preset(&self) -> Preset {
        match self {
            Self::RawInjection { .. } => Preset::Hid,
            Self::FocusGated { .. } | Self::DryRun => Preset::Synthetic,
        }
    }
}

/// Preset selection for the mapping table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresetChoice {
    /// The backend's natural preset.
    #[default]
    Auto,
    Hid,
    Synthetic,
    /// Entries only.
    None,
}

/// A token value in `[keymap.entries]`: a keycode integer or a key name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TokenValue {
    Keycode(u8),
    Name(String),
}

impl From<&TokenValue> for BackendToken {
    fn from(value: &TokenValue) -> Self {
        match value {
            TokenValue::Keycode(code) => BackendToken::Keycode(*code),
            TokenValue::Name(name) => BackendToken::Name(name.clone()),
        }
    }
}

/// Mapping table settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeymapConfig {
    #[serde(default)]
    pub preset: PresetChoice,
    /// Restricts the final table to these keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Vec<String>>,
    /// Per-key overrides, keyed by abstract key name (`"PageUp"`, `"a"`).
    #[serde(default)]
    pub entries: BTreeMap<String, TokenValue>,
}

impl KeymapConfig {
    /// Builds the mapping table: preset, then entries, then restriction.
    ///
    /// # Errors
    ///
    /// [`MappingError::UnknownKeyName`] for a name that is not an abstract
    /// key, [`MappingError::EmptyTable`] if nothing is mapped.
    pub fn build_table(&self, backend_default: Preset) -> Result<KeyMappingTable, MappingError> {
        let preset = match self.preset {
            PresetChoice::Auto => Some(backend_default),
            PresetChoice::Hid => Some(Preset::Hid),
            PresetChoice::Synthetic => Some(Preset::Synthetic),
            PresetChoice::None => None,
        };
        let overrides = self
            .entries
            .iter()
            .map(|(name, value)| -> Result<_, MappingError> {
                Ok((name.parse::<AbstractKey>()?, BackendToken::from(value)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let table = KeyMappingTable::layered(preset, overrides)?;

        match &self.only {
            Some(names) => {
                let keys = names
                    .iter()
                    .map(|n| n.parse::<AbstractKey>())
                    .collect::<Result<Vec<_>, _>>()?;
                table.restrict(&keys)
            }
            None => Ok(table),
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5001
}
fn default_max_workers() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_device_port() -> u16 {
    8704
}
fn default_timeout_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_workers: default_max_workers(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// The listen address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if `bind_address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("bind_address {:?} is not an IP address", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl AppConfig {
    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;
        if self.server.max_workers == 0 {
            return Err(ConfigError::Invalid("server.max_workers must be at least 1".into()));
        }
        if self.server.max_workers > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Invalid(format!(
                "server.max_workers must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        match &self.backend {
            BackendConfig::RawInjection { host, timeout_ms, .. } => {
                if host.is_empty() {
                    return Err(ConfigError::Invalid("backend.host is empty".into()));
                }
                if *timeout_ms == 0 {
                    return Err(ConfigError::Invalid("backend.timeout_ms must be positive".into()));
                }
            }
            BackendConfig::FocusGated {
                window_class: None,
                window_title: None,
            } => {
                return Err(ConfigError::Invalid(
                    "focus_gated backend needs window_class or window_title".into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Picks the config file path: `arg`, then `$KEY_RELAY_CONFIG`, then the
/// platform directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither override is set
/// and the platform base directory cannot be determined.
pub fn resolve_config_path(arg: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = arg {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Renders `config` as TOML, for writing a starter file.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if serialization fails.
pub fn render_config(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Resolves the platform config directory including the `KeyRelay` part.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyRelay"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("key-relay"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyRelay")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
