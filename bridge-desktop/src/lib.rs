//! # Desktop Bridge Implementations
//!
//! Default implementations of the host bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `BackgroundExecutor` using tokio timers
//! - `SettingsStore` using a SQLite-backed key-value store
//! - `PreferenceStore` layered over any `SettingsStore`
//! - `BadgeIndicator` that logs badge changes
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_desktop::{LogBadge, SqliteSettingsStore, StoredPreferences, TokioBackgroundExecutor};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let settings = Arc::new(SqliteSettingsStore::new("data/settings.db".into()).await?);
//!     let preferences = Arc::new(
//!         StoredPreferences::new(settings.clone()).with_default("sync.enabled", "none"),
//!     );
//!     let executor = Arc::new(TokioBackgroundExecutor::new());
//!     let badge = Arc::new(LogBadge::new());
//!
//!     // Hand these to SyncManager through SyncBridges
//!     Ok(())
//! }
//! ```

mod background;
mod badge;
mod preferences;
mod settings;

pub use background::TokioBackgroundExecutor;
pub use badge::LogBadge;
pub use preferences::StoredPreferences;
pub use settings::SqliteSettingsStore;
