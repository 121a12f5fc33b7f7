//! Workspace placeholder crate.
//!
//! Host applications can depend on `drive-sync-workspace` to get the sync
//! orchestrator and, with the default `desktop-shims` feature, the tokio/SQLite
//! host bridges without wiring each crate individually.

pub use core_sync::*;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
