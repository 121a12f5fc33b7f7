//! # Authentication Module
//!
//! Credential management for the cloud drives the sync core can bind to.
//!
//! ## Overview
//!
//! The sync core never runs an OAuth flow itself. It asks a [`TokenProvider`]
//! for a bearer token, silently when syncing in the background and
//! interactively when the user explicitly signs in. [`TokenManager`] is the
//! default provider: it caches tokens per provider and delegates the actual
//! browser/web flow to a host-supplied [`AuthFlow`].
//!
//! ## Features
//!
//! - Closed set of providers ([`ProviderKind`])
//! - Automatic refresh before expiration
//! - Idempotent revocation
//! - Auth state event emission

pub mod error;
pub mod manager;
pub mod provider;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::TokenManager;
pub use provider::{AuthFlow, TokenProvider};
pub use types::{AccessToken, ProviderKind, TokenGrant};
