//! Key event requests and the action kinds a caller can ask for.
//!
//! # Press, hold, release (for beginners)
//!
//! Conceptually every key moves through a tiny state machine:
//!
//! ```text
//!   Idle ──hold-down──▶ Held ──release──▶ Idle
//!   Idle ──press (implicit down+up)──▶ Idle
//! ```
//!
//! The relay does **not** track that state.  It trusts the action kind the
//! caller sends and forwards it as-is, so a second hold-down or a release
//! without a prior hold-down reaches the backend unchanged.

use std::fmt;

use crate::keymap::key::AbstractKey;

/// The action a caller requests for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// A complete key stroke (down followed by up), performed atomically by
    /// the backend.
    Press,
    /// Key-down only; the key stays held until a matching release.
    HoldDown,
    /// Key-up only.
    Release,
}

impl KeyAction {
    /// Name of the RPC operation that carries this action.
    pub fn rpc_name(self) -> &'static str {
        match self {
            KeyAction::Press => "Send",
            KeyAction::HoldDown => "SendDown",
            KeyAction::Release => "SendUp",
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyAction::Press => "press",
            KeyAction::HoldDown => "hold-down",
            KeyAction::Release => "release",
        };
        f.write_str(s)
    }
}

/// One key plus one action, as received from a single RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEventRequest {
    pub key: AbstractKey,
    pub action: KeyAction,
}

impl KeyEventRequest {
    pub fn new(key: AbstractKey, action: KeyAction) -> Self {
        Self { key, action }
    }
}
