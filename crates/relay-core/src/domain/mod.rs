//! Domain layer: pure value types with no OS or transport dependencies.
//!
//! The relay has deliberately little domain state.  The only per-call value
//! is the [`event::KeyEventRequest`], created for one RPC and discarded once
//! it has been dispatched.

pub mod event;
