//! Workspace façade crate.
//!
//! Exposes feature flags that map to the individual workspace crates so host
//! applications (an HTTP or RPC layer) can depend on `playlist-tags` without
//! wiring each crate individually.
//!
//! - `desktop-shims` (default): the full [`core_service`] API surface with the
//!   reqwest-backed HTTP bridge.
//! - `aggregator-only`: just the pagination aggregator and the SQLite store,
//!   for hosts that bring their own remote playlist source.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "aggregator-only")]
pub use core_discovery as discovery;

#[cfg(feature = "aggregator-only")]
pub use core_library as library;
