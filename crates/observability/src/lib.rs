//! Tracing/logging setup shared by binaries and tests that host the registry.
//!
//! The registry itself only emits `tracing` events (`debug` for marking,
//! dispatching and clearing, `trace` per delivered or dropped event); this crate
//! decides where they go.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::{init, init_with_default_filter};
