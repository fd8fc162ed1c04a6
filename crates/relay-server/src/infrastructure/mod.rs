//! Infrastructure layer for the relay server.
//!
//! Contains everything that touches the outside world: the gRPC listener,
//! the kmbox UDP session, Win32 window and input APIs, and the config file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `relay_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`backend`** – Implementations of the adapters' collaborator traits
//!   (`KmboxSession`, the Win32 window and synthesizer types) plus recording
//!   fakes for tests, and `build_relay`, which assembles a `RelayService`
//!   from the config.
//!
//! - **`rpc`** – The tonic `KeyInput` service and the server loop.
//!
//! - **`storage`** – TOML configuration loading and validation.

pub mod backend;
pub mod rpc;
pub mod storage;
