//! # Status Broadcasting
//!
//! Publishes every observable status change to the event bus and keeps the
//! application badge in step with sync health.
//!
//! ## Badge rules
//!
//! | state        | last error        | badge                      |
//! |--------------|-------------------|----------------------------|
//! | not connected| any               | cleared                    |
//! | connected    | none              | cleared                    |
//! | connected    | network transient | cleared                    |
//! | connected    | grant invalid     | `x` red, asks to re-login  |
//! | connected    | other             | `x` red, generic error     |

use std::sync::Arc;

use bridge_traits::badge::{Badge, BadgeIndicator};
use core_runtime::events::{CoreEvent, EventBus};
use tracing::trace;

use crate::classifier::ErrorClass;

pub use core_runtime::events::{ConnectionState, ProgressEvent, ProgressPhase, SyncStatus};

pub const ERROR_BADGE_TEXT: &str = "x";
pub const ERROR_BADGE_COLOR: &str = "#F00";
pub const RELOGIN_TITLE: &str = "Sync error: please log in again";
pub const SYNC_ERROR_TITLE: &str = "Sync error";

/// Badge to show for a connection state and the class of the last failure.
pub fn badge_for(state: ConnectionState, last_error: Option<ErrorClass>) -> Option<Badge> {
    if state != ConnectionState::Connected {
        return None;
    }
    let title = match last_error? {
        ErrorClass::NetworkTransient => return None,
        ErrorClass::GrantInvalid => RELOGIN_TITLE,
        ErrorClass::Other => SYNC_ERROR_TITLE,
    };
    Some(Badge::new(ERROR_BADGE_TEXT, ERROR_BADGE_COLOR, title))
}

pub struct StatusBroadcaster {
    event_bus: EventBus,
    badge: Arc<dyn BadgeIndicator>,
}

impl StatusBroadcaster {
    pub fn new(event_bus: EventBus, badge: Arc<dyn BadgeIndicator>) -> Self {
        Self { event_bus, badge }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Broadcast a snapshot of `status`, then refresh the badge.
    pub fn publish(&self, status: &SyncStatus, last_error: Option<ErrorClass>) {
        let event = CoreEvent::SyncStatusUpdate {
            status: status.clone(),
        };
        if self.event_bus.emit(event).is_err() {
            trace!("No status subscribers");
        }
        self.badge.set_badge(badge_for(status.state, last_error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBadge(Mutex<Vec<Option<Badge>>>);

    impl BadgeIndicator for RecordingBadge {
        fn set_badge(&self, badge: Option<Badge>) {
            self.0.lock().unwrap().push(badge);
        }
    }

    #[test]
    fn test_badge_cleared_unless_connected() {
        for state in [
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
            ConnectionState::Disconnecting,
        ] {
            for class in [
                None,
                Some(ErrorClass::NetworkTransient),
                Some(ErrorClass::GrantInvalid),
                Some(ErrorClass::Other),
            ] {
                assert_eq!(badge_for(state, class), None, "{state} {class:?}");
            }
        }
    }

    #[test]
    fn test_badge_when_connected() {
        let connected = ConnectionState::Connected;
        assert_eq!(badge_for(connected, None), None);
        assert_eq!(badge_for(connected, Some(ErrorClass::NetworkTransient)), None);

        let relogin = badge_for(connected, Some(ErrorClass::GrantInvalid)).unwrap();
        assert_eq!(relogin, Badge::new("x", "#F00", RELOGIN_TITLE));

        let generic = badge_for(connected, Some(ErrorClass::Other)).unwrap();
        assert_eq!(generic.title, SYNC_ERROR_TITLE);
        assert_eq!(generic.color, "#F00");
    }

    #[tokio::test]
    async fn test_publish_emits_then_sets_badge() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let badge = Arc::new(RecordingBadge::default());
        let broadcaster = StatusBroadcaster::new(bus, badge.clone());

        let status = SyncStatus {
            state: ConnectionState::Connected,
            error_message: Some("boom".to_string()),
            login: true,
            ..Default::default()
        };
        broadcaster.publish(&status, Some(ErrorClass::Other));

        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::SyncStatusUpdate {
                status: status.clone()
            }
        );
        let recorded = badge.0.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].as_ref().map(|b| b.title.as_str()), Some(SYNC_ERROR_TITLE));
    }

    #[test]
    fn test_publish_without_subscribers_still_clears_badge() {
        let badge = Arc::new(RecordingBadge::default());
        let broadcaster = StatusBroadcaster::new(EventBus::new(4), badge.clone());

        broadcaster.publish(&SyncStatus::default(), None);
        assert_eq!(*badge.0.lock().unwrap(), vec![None]);
    }
}
