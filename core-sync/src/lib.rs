//! # Sync Orchestration Module
//!
//! Keeps a local document collection in sync with one user-selected cloud
//! drive in the background.
//!
//! ## Overview
//!
//! The heavy lifting (diffing, upload, download) belongs to a pluggable
//! [`SyncEngine`]. This crate decides *when* and *against which drive* the
//! engine runs:
//! - Binding and unbinding the enabled drive
//! - Tracking credential validity and classifying failures
//! - Scheduling recurring passes
//! - Broadcasting status and updating the sync-health badge
//!
//! ## Components
//!
//! - **Sync Manager** (`manager`): Connection state machine and public API
//! - **Readiness Gate** (`readiness`): Holds callers back until preferences are replayed
//! - **Scheduler** (`scheduler`): The single recurring `syncNow` timer
//! - **Error Classifier** (`classifier`): Transient vs. re-login vs. other failures
//! - **Status Broadcaster** (`status`): Status events and badge selection
//! - **Drive Factory** (`drive`): Closed set of supported drives
//! - **Engine Contract** (`engine`): Traits implemented by the sync engine

pub mod classifier;
pub mod drive;
pub mod engine;
pub mod error;
mod hooks;
pub mod manager;
pub mod readiness;
pub mod scheduler;
pub mod status;

pub use classifier::{classify, classify_remote, ErrorClass};
pub use core_auth::ProviderKind;
pub use core_runtime::config::SyncConfig;
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};
pub use drive::{CredentialSource, Drive, DriveFactory};
pub use engine::{SyncEngine, SyncEngineFactory, SyncHooks};
pub use error::{Result, SyncError};
pub use manager::{SyncBridges, SyncManager};
pub use readiness::ReadinessGate;
pub use scheduler::Scheduler;
pub use status::{
    badge_for, ConnectionState, ProgressEvent, ProgressPhase, StatusBroadcaster, SyncStatus,
};
