//! Backend adapters.
//!
//! Three implementations of [`BackendAdapter`]:
//!
//! - [`RawInjectionAdapter`] forwards HID keycodes to a hardware endpoint
//!   (a kmbox-style network injection device).  It has no concept of window
//!   focus: keys land wherever the OS currently sends keyboard input.
//!
//! - [`FocusGatedAdapter`] synthesizes named keys through the OS, but only
//!   while a specific target window has keyboard focus.  When the target is
//!   not focused the request is a silent no-op that still reports success.
//!
//! - [`DryRunAdapter`] accepts any token of its configured kind and only logs.
//!
//! # Collaborator traits (for beginners)
//!
//! The adapters never talk to sockets or Win32 directly.  They depend on the
//! small traits below, which the infrastructure layer implements:
//!
//! | Trait                | Production implementation                  |
//! |----------------------|--------------------------------------------|
//! | [`HardwareEndpoint`] | `infrastructure::backend::kmbox::KmboxSession` |
//! | [`TargetWindow`]     | `infrastructure::backend::win32::Win32Window`  |
//! | [`WindowFinder`]     | `infrastructure::backend::win32::Win32WindowFinder` |
//! | [`InputSynthesizer`] | `infrastructure::backend::win32::SendInputSynthesizer` |
//!
//! Tests substitute recording fakes from `infrastructure::backend::mock`.

use std::fmt;
use std::sync::{Arc, Mutex};

use relay_core::{BackendToken, KeyAction, TokenKind};
use tracing::{debug, info};

use super::relay_keys::{BackendAdapter, BackendError};

// ── Raw injection ─────────────────────────────────────────────────────────────

/// A device that injects HID keyboard reports.
///
/// Each method completes one round-trip with the device; a returned error
/// means the device did not acknowledge the command.
#[cfg_attr(test, mockall::automock)]
pub trait HardwareEndpoint: Send + Sync {
    /// Key-down then key-up of `code`, with `modifier` bits held for the
    /// duration.
    fn key_press(&self, code: u8, modifier: u8) -> Result<(), BackendError>;

    fn key_down(&self, code: u8) -> Result<(), BackendError>;

    fn key_up(&self, code: u8) -> Result<(), BackendError>;
}

/// Forwards keycode tokens to a [`HardwareEndpoint`].
pub struct RawInjectionAdapter {
    endpoint: Arc<dyn HardwareEndpoint>,
}

impl RawInjectionAdapter {
    pub fn new(endpoint: Arc<dyn HardwareEndpoint>) -> Self {
        Self { endpoint }
    }

    fn keycode(token: &BackendToken) -> Result<u8, BackendError> {
        token.keycode().ok_or(BackendError::UnsupportedToken {
            found: token.kind(),
        })
    }
}

impl BackendAdapter for RawInjectionAdapter {
    fn token_kind(&self) -> TokenKind {
        TokenKind::Keycode
    }

    fn press(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.endpoint.key_press(Self::keycode(token)?, 0)
    }

    fn hold_down(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.endpoint.key_down(Self::keycode(token)?)
    }

    fn release(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.endpoint.key_up(Self::keycode(token)?)
    }
}

// ── Focus-gated synthesis ─────────────────────────────────────────────────────

/// A synthesizer key: either one literal character or a named key such as
/// `ENTER` or `VK_SHIFT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStroke {
    Char(char),
    Named(String),
}

impl KeyStroke {
    /// Interprets a name token.  A one-character name is sent literally;
    /// anything longer is a named key.
    ///
    /// # Errors
    ///
    /// [`BackendError::UnsupportedToken`] for keycode tokens and
    /// [`BackendError::InvalidKeyName`] for the empty name.
    pub fn from_token(token: &BackendToken) -> Result<Self, BackendError> {
        let name = token.name().ok_or(BackendError::UnsupportedToken {
            found: token.kind(),
        })?;
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(BackendError::InvalidKeyName(String::new())),
            (Some(c), None) => Ok(Self::Char(c)),
            _ => Ok(Self::Named(name.to_string())),
        }
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c:?}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// The window that must have keyboard focus for input to be synthesized.
#[cfg_attr(test, mockall::automock)]
pub trait TargetWindow: Send + Sync {
    /// Whether this window is currently the keyboard-focus window.
    ///
    /// # Errors
    ///
    /// [`BackendError::WindowClosed`] if the window no longer exists.
    fn has_keyboard_focus(&self) -> Result<bool, BackendError>;
}

/// Emits synthesized keyboard input to the focused window.
#[cfg_attr(test, mockall::automock)]
pub trait InputSynthesizer: Send + Sync {
    fn synthesize(&self, stroke: &KeyStroke, action: KeyAction) -> Result<(), BackendError>;
}

/// Startup query for the target window.  Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowQuery {
    pub class_name: Option<String>,
    pub title: Option<String>,
}

impl fmt::Display for WindowQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class={:?} title={:?}",
            self.class_name.as_deref().unwrap_or("*"),
            self.title.as_deref().unwrap_or("*")
        )
    }
}

/// Looks up a top-level window by class name and/or title.
pub trait WindowFinder {
    fn find_window(&self, query: &WindowQuery)
        -> Result<Option<Arc<dyn TargetWindow>>, BackendError>;
}

/// Synthesizes name tokens while the bound window holds keyboard focus.
///
/// At most one synthesis runs at a time; the focus check and the synthesis
/// happen under the same lock so the pair is not interleaved with another
/// request's.
pub struct FocusGatedAdapter {
    window: Arc<dyn TargetWindow>,
    synthesizer: Arc<dyn InputSynthesizer>,
    gate: Mutex<()>,
}

impl FocusGatedAdapter {
    pub fn new(window: Arc<dyn TargetWindow>, synthesizer: Arc<dyn InputSynthesizer>) -> Self {
        Self {
            window,
            synthesizer,
            gate: Mutex::new(()),
        }
    }

    /// Locates the target window once and binds to it.
    ///
    /// # Errors
    ///
    /// [`BackendError::WindowNotFound`] if no window matches `query`, or any
    /// error the finder itself reports.
    pub fn attach(
        finder: &dyn WindowFinder,
        query: &WindowQuery,
        synthesizer: Arc<dyn InputSynthesizer>,
    ) -> Result<Self, BackendError> {
        let window = finder
            .find_window(query)?
            .ok_or_else(|| BackendError::WindowNotFound(query.to_string()))?;
        info!(%query, "bound to target window");
        Ok(Self::new(window, synthesizer))
    }

    fn gated(&self, token: &BackendToken, action: KeyAction) -> Result<(), BackendError> {
        let stroke = KeyStroke::from_token(token)?;
        // A panicked holder leaves no state behind the lock.
        let _guard = self.gate.lock().unwrap_or_else(|e| e.into_inner());

        if !self.window.has_keyboard_focus()? {
            debug!(%stroke, %action, "target window not focused; dropping key event");
            return Ok(());
        }
        debug!(%stroke, %action, "synthesizing key event");
        self.synthesizer.synthesize(&stroke, action)
    }
}

impl BackendAdapter for FocusGatedAdapter {
    fn token_kind(&self) -> TokenKind {
        TokenKind::Name
    }

    fn press(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.gated(token, KeyAction::Press)
    }

    fn hold_down(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.gated(token, KeyAction::HoldDown)
    }

    fn release(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.gated(token, KeyAction::Release)
    }

    fn requires_exclusive_dispatch(&self) -> bool {
        true
    }
}

// ── Dry run ───────────────────────────────────────────────────────────────────

/// Logs every action instead of performing it.
pub struct DryRunAdapter {
    kind: TokenKind,
}

impl DryRunAdapter {
    pub fn new(kind: TokenKind) -> Self {
        Self { kind }
    }

    fn log(&self, token: &BackendToken, action: KeyAction) -> Result<(), BackendError> {
        if token.kind() != self.kind {
            return Err(BackendError::UnsupportedToken {
                found: token.kind(),
            });
        }
        info!(%token, %action, "dry run");
        Ok(())
    }
}

impl BackendAdapter for DryRunAdapter {
    fn token_kind(&self) -> TokenKind {
        self.kind
    }

    fn press(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.log(token, KeyAction::Press)
    }

    fn hold_down(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.log(token, KeyAction::HoldDown)
    }

    fn release(&self, token: &BackendToken) -> Result<(), BackendError> {
        self.log(token, KeyAction::Release)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
