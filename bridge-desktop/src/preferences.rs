//! User Preferences over a Settings Store

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    storage::{PreferenceChange, PreferenceStore, SettingsStore},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, OnceCell, RwLock};
use tracing::debug;

/// Key prefix under which preferences are stored in the settings store.
pub const DEFAULT_PREFIX: &str = "prefs/";

const CHANGE_BUFFER: usize = 32;

/// [`PreferenceStore`] persisted in a [`SettingsStore`].
///
/// Values are loaded lazily on the first [`ready`](PreferenceStore::ready)
/// (or read) and cached. Keys without a stored value fall back to the
/// defaults registered with [`with_default`](Self::with_default).
pub struct StoredPreferences {
    store: Arc<dyn SettingsStore>,
    prefix: String,
    defaults: HashMap<String, String>,
    values: RwLock<HashMap<String, String>>,
    loaded: OnceCell<()>,
    tx: broadcast::Sender<PreferenceChange>,
}

impl StoredPreferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            store,
            prefix: DEFAULT_PREFIX.to_string(),
            defaults: HashMap::new(),
            values: RwLock::new(HashMap::new()),
            loaded: OnceCell::new(),
            tx,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn load(&self) -> Result<()> {
        let mut loaded = HashMap::new();
        for storage_key in self.store.list_keys().await? {
            let Some(key) = storage_key.strip_prefix(&self.prefix) else {
                continue;
            };
            if let Some(value) = self.store.get_string(&storage_key).await? {
                loaded.insert(key.to_string(), value);
            }
        }

        debug!(count = loaded.len(), "Loaded preferences");
        *self.values.write().await = loaded;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for StoredPreferences {
    async fn ready(&self) -> Result<()> {
        self.loaded.get_or_try_init(|| self.load()).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ready().await?;
        let values = self.values.read().await;
        Ok(values
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ready().await?;
        self.store
            .set_string(&self.storage_key(key), value)
            .await?;
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());

        debug!(key, value, "Preference updated");
        // No subscribers is fine
        let _ = self.tx.send(PreferenceChange {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.tx.subscribe()
    }
}
