//! # relay-core
//!
//! Shared library for the key-input relay containing the abstract key
//! vocabulary, backend token model, and key mapping tables.
//!
//! It has zero dependencies on OS APIs, RPC frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A remote controller (for example a game-automation client) asks the relay
//! to "press A" or "hold Shift".  It never learns which input mechanism the
//! receiving host uses: a hardware key-injection box that wants USB HID
//! keycodes, or an OS keyboard synthesizer that wants key *names*.
//!
//! This crate defines the translation between those worlds:
//!
//! - **`keymap`** – The closed [`AbstractKey`] enumeration used on the wire,
//!   the [`BackendToken`] a backend understands, and the immutable
//!   [`KeyMappingTable`] that maps one to the other.  Built-in presets cover
//!   HID keycodes and synthesizer key names.
//!
//! - **`domain`** – The transient [`KeyEventRequest`]: one key plus the
//!   action kind (press, hold-down, release).

pub mod domain;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `relay_core::AbstractKey` instead of `relay_core::keymap::key::AbstractKey`.
pub use domain::event::{KeyAction, KeyEventRequest};
pub use keymap::key::AbstractKey;
pub use keymap::{BackendToken, KeyMappingTable, MappingError, Preset, TokenKind};
