//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system carrying sync status updates
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, the tunable sync constants, and the
//! broadcast channel observers use to follow the orchestrator.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::SyncConfig;
pub use error::{Error, Result};
