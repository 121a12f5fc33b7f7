//! Storage Abstractions
//!
//! Provides platform-agnostic traits for local keyed storage and for user
//! preferences that can be observed for changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

/// Settings/local storage trait
///
/// Key-value string storage used for data the core owns but never shows to
/// the user, such as the opaque per-drive sync cursor.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_cursor(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("sync/state/dropbox", r#"{"cursor":"abc"}"#).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}

/// Notification emitted by a [`PreferenceStore`] after a value changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceChange {
    pub key: String,
    pub value: String,
}

/// User preference store
///
/// Preferences load asynchronously; [`ready`](PreferenceStore::ready) resolves
/// once values can be read. Every successful `set` is announced to
/// subscribers, including writes that store the same value again.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::PreferenceStore;
///
/// async fn watch(prefs: &dyn PreferenceStore) -> Result<()> {
///     prefs.ready().await?;
///     let mut changes = prefs.subscribe();
///     while let Ok(change) = changes.recv().await {
///         println!("{} = {}", change.key, change.value);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Resolves once preferences have been loaded.
    async fn ready(&self) -> Result<()>;

    /// Current value of a preference, or `None` if it has no value and no default.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Update a preference and notify subscribers.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Subscribe to subsequent changes of any preference.
    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange>;
}
