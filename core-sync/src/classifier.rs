//! Failure classification.
//!
//! Decides whether a failure is a transient connectivity problem, a revoked or
//! expired authorization grant, or anything else. Classification only looks
//! at the error kind, HTTP code and message, never at provider payloads.

use bridge_traits::error::{RemoteError, RemoteErrorKind};
use core_auth::AuthError;

use crate::error::SyncError;

const NETWORK_MARKERS: [&str; 3] = ["networkerror", "network error", "failed to fetch"];

/// Broad category of a sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Connectivity blip; retried on the next timer tick, no user action.
    NetworkTransient,
    /// The provider rejected the credential; the user must sign in again.
    GrantInvalid,
    Other,
}

pub fn classify(error: &SyncError) -> ErrorClass {
    match error {
        SyncError::Remote(remote) => classify_remote(remote),
        SyncError::Auth(auth) => classify_auth(auth),
        _ => ErrorClass::Other,
    }
}

pub fn classify_auth(error: &AuthError) -> ErrorClass {
    match error {
        AuthError::AuthRequired { .. } => ErrorClass::GrantInvalid,
        AuthError::Remote(remote) => classify_remote(remote),
        _ => ErrorClass::Other,
    }
}

pub fn classify_remote(error: &RemoteError) -> ErrorClass {
    if is_network_transient(error) {
        ErrorClass::NetworkTransient
    } else if is_grant_invalid(error) {
        ErrorClass::GrantInvalid
    } else {
        ErrorClass::Other
    }
}

pub fn is_network_transient(error: &RemoteError) -> bool {
    if error.kind == RemoteErrorKind::Transport {
        return true;
    }
    let message = error.message.to_lowercase();
    NETWORK_MARKERS.iter().any(|marker| message.contains(marker))
}

pub fn is_grant_invalid(error: &RemoteError) -> bool {
    match error.code {
        Some(401) => true,
        Some(400) => error.message.contains("invalid_grant"),
        _ => false,
    }
}
