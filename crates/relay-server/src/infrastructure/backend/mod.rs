//! Backend construction.
//!
//! Turns the `[backend]` and `[keymap]` config sections into a ready
//! [`RelayService`]: builds the mapping table, connects or binds the selected
//! backend's collaborators, and validates the table against the backend.
//! Every failure here is fatal at startup; nothing is retried.
//!
//! Platform-specific collaborators are selected at compile time via
//! `#[cfg(target_os = ...)]`.

pub mod kmbox;
pub mod mock;

#[cfg(target_os = "windows")]
pub mod win32;

use std::sync::Arc;
use std::time::Duration;

use relay_core::{KeyMappingTable, MappingError, TokenKind};
use thiserror::Error;
use tracing::info;

use crate::application::adapters::{DryRunAdapter, RawInjectionAdapter};
use crate::application::relay_keys::{BackendAdapter, BackendError, RelayService};
use crate::infrastructure::storage::config::{AppConfig, BackendConfig, ConfigError};

use self::kmbox::{KmboxError, KmboxSession};

/// Error type for relay initialization.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid key mapping: {0}")]
    Mapping(#[from] MappingError),

    #[error("backend initialization failed: {0}")]
    Backend(#[from] BackendError),

    #[error("hardware device unreachable: {0}")]
    Hardware(#[from] KmboxError),

    /// The configured backend does not exist on this OS.
    #[error("the {0} backend is not supported on this platform")]
    UnsupportedPlatform(&'static str),
}

/// Builds the relay described by `config`.
///
/// # Errors
///
/// Any [`StartupError`]: invalid config, unusable keymap, unreachable device,
/// missing target window, or a backend this platform lacks.
pub fn build_relay(config: &AppConfig) -> Result<RelayService, StartupError> {
    config.validate()?;
    let table = config
        .keymap
        .build_table(config.backend.default_preset())
        .map_err(ConfigError::from)?;
    let adapter = build_adapter(&config.backend, &table)?;

    if adapter.token_kind() == TokenKind::Name {
        table.ensure_named_keys()?;
    }
    let relay = RelayService::new(table, adapter)?;
    info!(
        mapped = relay.table().len(),
        exclusive = relay.requires_exclusive_dispatch(),
        "relay initialized"
    );
    Ok(relay)
}

/// Connects or binds the backend selected by `backend`.
///
/// # Errors
///
/// See [`build_relay`].
pub fn build_adapter(
    backend: &BackendConfig,
    table: &KeyMappingTable,
) -> Result<Arc<dyn BackendAdapter>, StartupError> {
    match backend {
        BackendConfig::RawInjection {
            host,
            port,
            uuid,
            timeout_ms,
        } => {
            let session =
                KmboxSession::connect(host, *port, uuid, Duration::from_millis(*timeout_ms))?;
            Ok(Arc::new(RawInjectionAdapter::new(Arc::new(session))))
        }
        BackendConfig::FocusGated {
            window_class,
            window_title,
        } => focus_gated(window_class.as_deref(), window_title.as_deref()),
        BackendConfig::DryRun => {
            // Mirror whatever token kind the table was built with.
            let kind = table
                .iter()
                .next()
                .map_or(TokenKind::Name, |(_, token)| token.kind());
            info!(%kind, "using dry-run backend; no input will be sent");
            Ok(Arc::new(DryRunAdapter::new(kind)))
        }
    }
}

#[cfg(target_os = "windows")]
fn focus_gated(
    class_name: Option<&str>,
    title: Option<&str>,
) -> Result<Arc<dyn BackendAdapter>, StartupError> {
    use crate::application::adapters::{FocusGatedAdapter, WindowQuery};
    use self::win32::{SendInputSynthesizer, Win32WindowFinder};

    let query = WindowQuery {
        class_name: class_name.map(str::to_string),
        title: title.map(str::to_string),
    };
    let adapter =
        FocusGatedAdapter::attach(&Win32WindowFinder, &query, Arc::new(SendInputSynthesizer))?;
    Ok(Arc::new(adapter))
}

#[cfg(not(target_os = "windows"))]
fn focus_gated(
    _class_name: Option<&str>,
    _title: Option<&str>,
) -> Result<Arc<dyn BackendAdapter>, StartupError> {
    Err(StartupError::UnsupportedPlatform("focus_gated"))
}
