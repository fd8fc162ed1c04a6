//! relay-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the relay do? (for beginners)
//!
//! A controller program on another machine decides which keys to press, for
//! example a bot driving a game.  It calls this server over gRPC with an
//! abstract key (`Up`, `A`, `Enter`) and one of three operations: `Send`
//! (press), `SendDown` (hold) or `SendUp` (release).
//!
//! The server:
//!
//! 1. Checks the wire value is a known key.
//! 2. Looks the key up in its mapping table to get the backend's token, a HID
//!    keycode or a key name.
//! 3. Hands the token to the configured backend:
//!    - **raw injection**: a kmbox-Net box plugged into the target machine
//!      types the key as a real USB keyboard;
//!    - **focus gated**: the OS synthesizes the key, but only while the
//!      target window has keyboard focus;
//!    - **dry run**: the request is only logged.
//! 4. Returns success, or a gRPC status describing what went wrong.

/// Application layer: the relay use case and backend adapters.
pub mod application;

/// Infrastructure layer: gRPC, hardware, OS, and configuration adapters.
pub mod infrastructure;
