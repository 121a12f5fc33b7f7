//! # Host Bridge Traits
//!
//! Capability traits that the host application implements for the sync core.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync orchestrator and the
//! environment it runs in. Each trait represents a capability the core needs
//! but does not own: where documents live, where preferences are kept, how
//! timers fire, and how sync health is shown to the user.
//!
//! ## Traits
//!
//! ### Documents & Storage
//! - [`DocumentStore`](documents::DocumentStore) - Local document collection (read/write/delete by id)
//! - [`SettingsStore`](storage::SettingsStore) - Local keyed storage for opaque sync state
//! - [`PreferenceStore`](storage::PreferenceStore) - User preferences with change notifications
//!
//! ### Platform Integration
//! - [`BackgroundExecutor`](background::BackgroundExecutor) - Named periodic timers
//! - [`BadgeIndicator`](badge::BadgeIndicator) - Visual sync-health indicator
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Errors coming back
//! from a remote provider are carried as [`RemoteError`](error::RemoteError),
//! which keeps the code/name/message triple the core classifies on.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across tokio
//! tasks behind an `Arc`.

pub mod background;
pub mod badge;
pub mod documents;
pub mod error;
pub mod storage;
pub mod time;

pub use error::{BridgeError, RemoteError, RemoteErrorKind};

// Re-export commonly used types
pub use background::{BackgroundExecutor, TaskHandler, TaskId, TaskStatus};
pub use badge::{Badge, BadgeIndicator};
pub use documents::{Document, DocumentRef, DocumentStore, Revision};
pub use storage::{PreferenceChange, PreferenceStore, SettingsStore};
pub use time::{Clock, LogLevel, SystemClock};
