//! Key mapping tables: abstract key → backend token.
//!
//! The wire vocabulary is [`AbstractKey`].  Each backend understands exactly
//! one kind of [`BackendToken`]: a numeric HID keycode for hardware injection,
//! or a symbolic key name for OS keyboard synthesis.  A [`KeyMappingTable`]
//! holds one token per mapped key and is built once, before the service
//! starts, then never mutated.
//!
//! A table may deliberately cover only a subset of the keys.  Looking up an
//! unmapped key is an explicit [`MappingError::Unmapped`]; there is never a
//! default token.

pub mod hid;
pub mod key;
pub mod synthetic;
pub mod windows_vk;

use std::fmt;

use thiserror::Error;
use tracing::debug;

pub use key::AbstractKey;

/// Errors raised while building or querying a mapping table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    /// The requested key has no entry in the active table.
    #[error("key {0} is not mapped for the active backend")]
    Unmapped(AbstractKey),
    /// A table was built with no entries at all.
    #[error("key mapping table is empty")]
    EmptyTable,
    /// A token does not have the kind the backend expects.
    #[error("key {key} maps to a {found} token but the backend expects a {expected}")]
    TokenKind {
        key: AbstractKey,
        expected: TokenKind,
        found: TokenKind,
    },
    /// A configuration name is not one of the abstract keys.
    #[error("unknown key name {0:?}")]
    UnknownKeyName(String),
    /// A wire value is outside the abstract key enumeration.
    #[error("key value {0} is outside the key enumeration")]
    InvalidKeyValue(i32),
    /// A multi-character synthesizer token is not a known named key.
    #[error("key {key} maps to unknown named key {name:?}")]
    UnknownNamedKey { key: AbstractKey, name: String },
    /// A synthesizer token is the empty string.
    #[error("key {0} maps to an empty key name")]
    EmptyName(AbstractKey),
}

/// The kind of token a backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Numeric hardware keycode.
    Keycode,
    /// Symbolic key name.
    Name,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keycode => f.write_str("keycode"),
            TokenKind::Name => f.write_str("key name"),
        }
    }
}

/// Backend-specific representation of one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendToken {
    /// Hardware keycode (USB HID usage ID).
    Keycode(u8),
    /// Symbolic key name: one character (typed literally) or a named key.
    Name(String),
}

impl BackendToken {
    pub fn kind(&self) -> TokenKind {
        match self {
            BackendToken::Keycode(_) => TokenKind::Keycode,
            BackendToken::Name(_) => TokenKind::Name,
        }
    }

    pub fn keycode(&self) -> Option<u8> {
        match self {
            BackendToken::Keycode(code) => Some(*code),
            BackendToken::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            BackendToken::Keycode(_) => None,
            BackendToken::Name(name) => Some(name),
        }
    }
}

impl From<u8> for BackendToken {
    fn from(code: u8) -> Self {
        BackendToken::Keycode(code)
    }
}

impl From<&str> for BackendToken {
    fn from(name: &str) -> Self {
        BackendToken::Name(name.to_string())
    }
}

impl fmt::Display for BackendToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendToken::Keycode(code) => write!(f, "{code}"),
            BackendToken::Name(name) => f.write_str(name),
        }
    }
}

/// Built-in complete tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// USB HID usage IDs, for hardware injection.
    Hid,
    /// Synthesizer key names, for focus-gated synthetic input.
    Synthetic,
}

impl Preset {
    /// Token this preset assigns to `key`.  Presets cover every key.
    pub fn token(self, key: AbstractKey) -> BackendToken {
        match self {
            Preset::Hid => BackendToken::Keycode(hid::hid_usage(key)),
            Preset::Synthetic => BackendToken::Name(synthetic::key_name(key).to_string()),
        }
    }

    pub fn token_kind(self) -> TokenKind {
        match self {
            Preset::Hid => TokenKind::Keycode,
            Preset::Synthetic => TokenKind::Name,
        }
    }

    /// All `(key, token)` pairs of the preset, in wire order.
    pub fn entries(self) -> impl Iterator<Item = (AbstractKey, BackendToken)> {
        AbstractKey::ALL.into_iter().map(move |k| (k, self.token(k)))
    }
}

/// Immutable abstract key → backend token table.
///
/// Slots are indexed by [`AbstractKey::index`], giving O(1) lookups on the
/// per-request hot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMappingTable {
    slots: Vec<Option<BackendToken>>,
    len: usize,
}

impl KeyMappingTable {
    /// Builds a table from explicit entries.  A later entry for the same key
    /// replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::EmptyTable`] if `entries` is empty.
    pub fn new<I>(entries: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (AbstractKey, BackendToken)>,
    {
        let mut slots = vec![None; AbstractKey::COUNT];
        for (key, token) in entries {
            slots[key.index()] = Some(token);
        }
        Self::from_slots(slots)
    }

    /// Builds the complete table of a preset.
    pub fn from_preset(preset: Preset) -> Self {
        let slots: Vec<Option<BackendToken>> = preset.entries().map(|(_, t)| Some(t)).collect();
        Self {
            len: slots.len(),
            slots,
        }
    }

    /// Layers `overrides` on top of an optional preset.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::EmptyTable`] if there is no preset and no override.
    pub fn layered<I>(preset: Option<Preset>, overrides: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (AbstractKey, BackendToken)>,
    {
        let mut slots = match preset {
            Some(p) => Self::from_preset(p).slots,
            None => vec![None; AbstractKey::COUNT],
        };
        let mut overridden = 0usize;
        for (key, token) in overrides {
            slots[key.index()] = Some(token);
            overridden += 1;
        }
        debug!(?preset, overridden, "building key mapping table");
        Self::from_slots(slots)
    }

    /// Returns a copy restricted to `keys`.  Keys not present in `self` are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::EmptyTable`] if no key survives the restriction.
    pub fn restrict(&self, keys: &[AbstractKey]) -> Result<Self, MappingError> {
        let mut slots = vec![None; AbstractKey::COUNT];
        for &key in keys {
            slots[key.index()] = self.slots[key.index()].clone();
        }
        Self::from_slots(slots)
    }

    fn from_slots(slots: Vec<Option<BackendToken>>) -> Result<Self, MappingError> {
        let len = slots.iter().filter(|s| s.is_some()).count();
        if len == 0 {
            return Err(MappingError::EmptyTable);
        }
        Ok(Self { slots, len })
    }

    /// Resolves `key` to its backend token.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Unmapped`] if the table has no entry for `key`.
    #[inline]
    pub fn resolve(&self, key: AbstractKey) -> Result<&BackendToken, MappingError> {
        self.slots[key.index()]
            .as_ref()
            .ok_or(MappingError::Unmapped(key))
    }

    pub fn contains(&self, key: AbstractKey) -> bool {
        self.slots[key.index()].is_some()
    }

    /// Number of mapped keys.  Always at least one.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over mapped entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (AbstractKey, &BackendToken)> {
        AbstractKey::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(k, slot)| slot.as_ref().map(|t| (*k, t)))
    }

    /// Checks that every token has the kind the active backend accepts.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::TokenKind`] for the first mismatching entry.
    pub fn ensure_token_kind(&self, expected: TokenKind) -> Result<(), MappingError> {
        match self.iter().find(|(_, t)| t.kind() != expected) {
            Some((key, token)) => Err(MappingError::TokenKind {
                key,
                expected,
                found: token.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Checks that every name token is either one character or a named key
    /// known to [`windows_vk::named_key_vk`].  Keycode tokens are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::EmptyName`] or [`MappingError::UnknownNamedKey`].
    pub fn ensure_named_keys(&self) -> Result<(), MappingError> {
        for (key, token) in self.iter() {
            let Some(name) = token.name() else { continue };
            match name.chars().count() {
                0 => return Err(MappingError::EmptyName(key)),
                1 => {}
                _ if windows_vk::named_key_vk(name).is_some() => {}
                _ => {
                    return Err(MappingError::UnknownNamedKey {
                        key,
                        name: name.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
