//! # Sync Configuration
//!
//! Tunable constants of the sync orchestrator.
//!
//! ## Overview
//!
//! `SyncConfig` carries the scheduling intervals and the storage keys the
//! orchestrator uses. Defaults match production behavior; tests shorten the
//! intervals with the `with_*` setters.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::SyncConfig;
//! use std::time::Duration;
//!
//! let config = SyncConfig::default()
//!     .with_sync_delay(Duration::from_secs(5))
//!     .with_sync_interval(Duration::from_secs(600));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.state_key("dropbox"), "sync/state/dropbox");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use std::time::Duration;

/// Delay before the first pass after a local write (1 minute).
pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_secs(60);

/// Interval between periodic passes (30 minutes).
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Name of the periodic sync timer.
pub const DEFAULT_TASK_NAME: &str = "syncNow";

/// Preference holding the enabled provider name, or [`DRIVE_NONE`].
pub const DEFAULT_ENABLED_PREFERENCE_KEY: &str = "sync.enabled";

/// Prefix of the per-drive persisted sync state keys.
pub const DEFAULT_STATE_KEY_PREFIX: &str = "sync/state/";

/// Sentinel preference value meaning "no drive enabled".
pub const DRIVE_NONE: &str = "none";

/// Sync orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay before the first pass after `put`/`delete`
    pub sync_delay: Duration,

    /// Period of the recurring pass
    pub sync_interval: Duration,

    /// Name of the recurring timer task
    pub task_name: String,

    /// Preference key storing the enabled provider
    pub enabled_preference_key: String,

    /// Prefix for per-drive persisted state keys
    pub state_key_prefix: String,

    /// Event bus capacity per subscriber
    pub event_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_delay: DEFAULT_SYNC_DELAY,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            task_name: DEFAULT_TASK_NAME.to_string(),
            enabled_preference_key: DEFAULT_ENABLED_PREFERENCE_KEY.to_string(),
            state_key_prefix: DEFAULT_STATE_KEY_PREFIX.to_string(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl SyncConfig {
    /// Sets the delay before the first pass after a local write
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = delay;
        self
    }

    /// Sets the recurring pass period
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the timer task name
    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    /// Sets the enabled-provider preference key
    pub fn with_enabled_preference_key(mut self, key: impl Into<String>) -> Self {
        self.enabled_preference_key = key.into();
        self
    }

    /// Sets the persisted state key prefix
    pub fn with_state_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.state_key_prefix = prefix.into();
        self
    }

    /// Sets the event bus capacity
    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Storage key of the persisted sync state for a drive.
    pub fn state_key(&self, drive_name: &str) -> String {
        format!("{}{}", self.state_key_prefix, drive_name)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Both durations are non-zero
    /// - The write delay does not exceed the periodic interval
    /// - Keys and task name are not empty
    /// - The event buffer can hold at least one event
    pub fn validate(&self) -> Result<()> {
        if self.sync_delay.is_zero() {
            return Err(Error::Config("Sync delay must be greater than zero".to_string()));
        }

        if self.sync_interval.is_zero() {
            return Err(Error::Config(
                "Sync interval must be greater than zero".to_string(),
            ));
        }

        if self.sync_delay > self.sync_interval {
            return Err(Error::Config(format!(
                "Sync delay ({:?}) cannot exceed sync interval ({:?})",
                self.sync_delay, self.sync_interval
            )));
        }

        if self.task_name.trim().is_empty() {
            return Err(Error::Config("Task name cannot be empty".to_string()));
        }

        if self.enabled_preference_key.trim().is_empty() {
            return Err(Error::Config(
                "Enabled preference key cannot be empty".to_string(),
            ));
        }

        if self.state_key_prefix.is_empty() {
            return Err(Error::Config("State key prefix cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
