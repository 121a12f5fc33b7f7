//! Visual Sync-Health Indicator

use serde::{Deserialize, Serialize};

/// Badge overlay shown on the application icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Short text drawn on the badge
    pub text: String,
    /// CSS-style color (e.g. `#F00`)
    pub color: String,
    /// Tooltip shown on hover
    pub title: String,
}

impl Badge {
    pub fn new(text: impl Into<String>, color: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: color.into(),
            title: title.into(),
        }
    }
}

/// Host-side badge renderer.
///
/// `set_badge(None)` clears any override. Implementations must not block:
/// the core calls this synchronously after every status change.
pub trait BadgeIndicator: Send + Sync {
    fn set_badge(&self, badge: Option<Badge>);
}
