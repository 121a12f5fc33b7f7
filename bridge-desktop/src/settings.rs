//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> BridgeError {
    move |e| BridgeError::DatabaseError(format!("{}: {}", context, e))
}

/// SQLite-backed settings store implementation
///
/// Persists the opaque per-drive sync state (and, through
/// [`StoredPreferences`](crate::StoredPreferences), user preferences) as
/// string key-value rows.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) a settings database at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs use forward slashes on every platform
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
            .map_err(db_error("Invalid database path"))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to DB"))?;
        Self::create_table(&pool).await?;

        debug!(path = ?db_path, "Initialized settings store");
        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // Every SQLite connection gets its own in-memory database, so the pool
        // keeps exactly one connection alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error("Failed to connect to DB"))?;
        Self::create_table(&pool).await?;

        Ok(Self { pool })
    }

    async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(db_error("Failed to create table"))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to set setting"))?;

        debug!(key, "Stored setting");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get setting"))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete setting"))?;

        debug!(key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to check key"))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list keys"))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to clear settings"))?;

        debug!("Cleared all settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store
            .set_string("sync/state/dropbox", r#"{"cursor":"abc"}"#)
            .await
            .unwrap();
        let value = store.get_string("sync/state/dropbox").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"cursor":"abc"}"#));
        assert!(store.has_key("sync/state/dropbox").await.unwrap());

        store.delete("sync/state/dropbox").await.unwrap();
        assert_eq!(store.get_string("sync/state/dropbox").await.unwrap(), None);
        assert!(!store.has_key("sync/state/dropbox").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_and_delete_missing() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("key", "one").await.unwrap();
        store.set_string("key", "two").await.unwrap();
        assert_eq!(store.get_string("key").await.unwrap().as_deref(), Some("two"));

        store.delete("never-written").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_keys_and_clear() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("key2", "value2").await.unwrap();
        store.set_string("key1", "value1").await.unwrap();

        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec!["key1", "key2"]);

        store.clear_all().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.db");

        {
            let store = SqliteSettingsStore::new(path.clone()).await.unwrap();
            store.set_string("sync.enabled", "google").await.unwrap();
        }

        let reopened = SqliteSettingsStore::new(path).await.unwrap();
        assert_eq!(
            reopened.get_string("sync.enabled").await.unwrap().as_deref(),
            Some("google")
        );
    }
}
