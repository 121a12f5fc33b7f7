//! Engine callbacks backed by the orchestrator's stores.

use std::cmp::Ordering;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bridge_traits::documents::{Document, Revision};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use core_runtime::events::ProgressEvent;
use tracing::{debug, warn};

use crate::drive::Drive;
use crate::engine::{SyncEngine, SyncHooks};
use crate::manager::SyncManager;

/// [`SyncHooks`] implementation handed to the engine by [`SyncManager`].
///
/// Holds a weak reference so the engine never keeps the manager alive.
pub(crate) struct ManagerHooks {
    manager: Weak<SyncManager>,
}

impl ManagerHooks {
    pub(crate) fn new(manager: Weak<SyncManager>) -> Self {
        Self { manager }
    }

    fn manager(&self) -> BridgeResult<Arc<SyncManager>> {
        self.manager
            .upgrade()
            .ok_or_else(|| BridgeError::NotAvailable("sync manager has been dropped".to_string()))
    }
}

#[async_trait]
impl SyncHooks for ManagerHooks {
    async fn on_get(&self, id: &str) -> BridgeResult<Option<Document>> {
        self.manager()?.documents().get_by_id(id).await
    }

    async fn on_put(&self, doc: Document) -> BridgeResult<Revision> {
        self.manager()?.documents().put_by_id(doc).await
    }

    async fn on_delete(&self, id: &str, rev: Revision) -> BridgeResult<()> {
        self.manager()?.documents().delete_by_id(id, rev).await
    }

    async fn on_first_sync(&self, engine: &dyn SyncEngine) -> BridgeResult<()> {
        let docs = self.manager()?.documents().get_all().await?;
        debug!(count = docs.len(), "Queueing local documents for first sync");
        for doc in docs {
            if let Err(e) = engine.put(&doc.id, doc.rev).await {
                warn!(id = %doc.id, error = %e, "Failed to queue document");
            }
        }
        Ok(())
    }

    async fn on_progress(&self, drive: &Drive, event: ProgressEvent) {
        if let Ok(manager) = self.manager() {
            manager.apply_progress(drive.epoch(), event).await;
        }
    }

    fn compare_revision(&self, a: Revision, b: Revision) -> Ordering {
        match self.manager.upgrade() {
            Some(manager) => manager.documents().compare_revision(a, b),
            None => a.cmp(&b),
        }
    }

    async fn get_state(&self, drive: &Drive) -> BridgeResult<Option<serde_json::Value>> {
        self.manager()?.load_drive_state(drive).await
    }

    async fn set_state(&self, drive: &Drive, state: serde_json::Value) -> BridgeResult<()> {
        self.manager()?.save_drive_state(drive, state).await
    }
}
