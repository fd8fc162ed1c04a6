//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module resolves where the TOML file lives, reads it (or
//! falls back to defaults on first run), validates it, and turns its
//! `[keymap]` section into a `KeyMappingTable`.

pub mod config;
