//! Application layer use cases for the relay server.
//!
//! - **`relay_keys`** – The [`relay_keys::RelayService`] use case: resolves an
//!   abstract key through the mapping table and performs the requested action
//!   on the configured backend.  Also defines the [`relay_keys::BackendAdapter`]
//!   trait every backend implements.
//!
//! - **`adapters`** – The three backend adapters (raw hardware injection,
//!   focus-gated OS synthesis, dry run) and the narrow collaborator traits they
//!   drive.  OS and network implementations of those traits are injected from
//!   the infrastructure layer.

pub mod adapters;
pub mod relay_keys;
