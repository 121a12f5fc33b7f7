//! # Event Bus System
//!
//! Broadcasts sync status and credential events to observers using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Payload Types**: [`SyncStatus`] and the pieces it is made of
//! - **Event Types**: [`CoreEvent`] wrapping status updates and auth events
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌────────────┐
//! │ SyncManager  ├────────────>│           ├──────────────>│ Popup / UI │
//! └──────────────┘             │ EventBus  │               └────────────┘
//! ┌──────────────┐    emit     │           │   subscribe   ┌────────────┐
//! │ TokenManager ├────────────>│           ├──────────────>│ Editor     │
//! └──────────────┘             └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncStatus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::SyncStatusUpdate { status: SyncStatus::default() })
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::SyncStatusUpdate { .. }));
//! # }
//! ```
//!
//! ## Wire Format
//!
//! Events serialize with a `method` tag so hosts can forward them verbatim:
//!
//! ```text
//! {"method":"syncStatusUpdate","status":{"state":"connected","syncing":false,...}}
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the next `recv` returns the oldest retained event.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat as shutdown.
//!
//! Publishing never waits for subscribers. Emitting with no subscribers
//! returns an error which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Status Payload
// ============================================================================

/// Connection lifecycle state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No drive bound
    #[default]
    Disconnected,
    /// Drive bound, first pass not finished yet
    Connecting,
    /// Drive bound and periodic sync armed
    Connected,
    /// Teardown in progress
    Disconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a sync pass as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Start,
    Progress,
    End,
}

/// Progress notification emitted by the sync engine during a pass.
///
/// `detail` is provider-specific and passed through to observers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    #[serde(flatten)]
    pub detail: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ProgressEvent {
    pub fn start() -> Self {
        Self {
            phase: ProgressPhase::Start,
            detail: None,
        }
    }

    pub fn end() -> Self {
        Self {
            phase: ProgressPhase::End,
            detail: None,
        }
    }

    pub fn progress(detail: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            phase: ProgressPhase::Progress,
            detail: Some(detail),
        }
    }
}

/// Consolidated sync status broadcast to observers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Connection lifecycle state
    pub state: ConnectionState,
    /// A pass is between its start and end events
    pub syncing: bool,
    /// Last in-pass progress payload, cleared when the pass ends
    pub progress: Option<ProgressEvent>,
    /// Provider identifier of the bound drive
    pub current_drive_name: Option<String>,
    /// Message of the last sync failure
    pub error_message: Option<String>,
    /// Whether the last credential check succeeded
    pub login: bool,
}

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum CoreEvent {
    /// Full status snapshot, sent after every observable transition.
    SyncStatusUpdate { status: SyncStatus },
    /// Credential lifecycle notification.
    Auth(AuthEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::SyncStatusUpdate { .. } => "Sync status updated",
            CoreEvent::Auth(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::SyncStatusUpdate { status } if status.error_message.is_some() => {
                EventSeverity::Warning
            }
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to provider credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A fresh credential was obtained.
    SignedIn {
        /// Provider identifier (e.g., "dropbox").
        provider: String,
    },
    /// The cached credential was revoked.
    SignedOut {
        /// Provider identifier.
        provider: String,
    },
    /// Credential acquisition failed.
    AuthError {
        /// Provider identifier.
        provider: String,
        /// Human-readable error message.
        message: String,
        /// Whether a retry may succeed without user action.
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn { .. } => "Provider credential obtained",
            AuthEvent::SignedOut { .. } => "Provider credential revoked",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscription receiving events emitted from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events not matching a predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events for which `predicate` returns `true`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield status updates.
    pub fn status_updates(receiver: Receiver<CoreEvent>) -> Self {
        Self::new(receiver).filter(|event| matches!(event, CoreEvent::SyncStatusUpdate { .. }))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. Returns `None` when no matching event is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drain every matching event currently queued.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
