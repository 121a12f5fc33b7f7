//! Badge indicator that logs changes

use bridge_traits::badge::{Badge, BadgeIndicator};
use std::sync::Mutex;
use tracing::{info, warn};

/// [`BadgeIndicator`] for hosts without an icon overlay.
///
/// Logs every change and keeps the current badge for inspection.
#[derive(Default)]
pub struct LogBadge {
    current: Mutex<Option<Badge>>,
}

impl LogBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Badge> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl BadgeIndicator for LogBadge {
    fn set_badge(&self, badge: Option<Badge>) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == badge {
            return;
        }

        match &badge {
            Some(badge) => warn!(text = %badge.text, color = %badge.color, title = %badge.title, "Sync badge set"),
            None => info!("Sync badge cleared"),
        }
        *current = badge;
    }
}
