//! # Sync Engine Contract
//!
//! The engine performs the actual document transfer between the local
//! collection and a cloud drive. The orchestrator binds a [`Drive`], drives the
//! engine's lifecycle and answers its callbacks through [`SyncHooks`].
//!
//! ```text
//!   SyncManager ──use_drive/init/sync_now/put/delete──> SyncEngine
//!        ^                                                  │
//!        └──────────────── SyncHooks callbacks ─────────────┘
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::documents::{Document, Revision};
use bridge_traits::error::{RemoteError, Result as BridgeResult};
use core_runtime::events::ProgressEvent;

use crate::drive::Drive;

/// Document sync engine for a single bound drive.
#[async_trait]
pub trait SyncEngine: Send + Sync {
    /// Bind the drive used by subsequent operations.
    fn use_drive(&self, drive: Drive);

    /// Prepare the bound drive (load state, create remote folders). Idempotent.
    async fn init(&self) -> Result<(), RemoteError>;

    /// Release the bound drive and any in-memory state.
    async fn uninit(&self) -> Result<(), RemoteError>;

    /// Run one full sync pass.
    async fn sync_now(&self) -> Result<(), RemoteError>;

    /// Queue a local modification for upload.
    async fn put(&self, id: &str, rev: Revision) -> Result<(), RemoteError>;

    /// Queue a local deletion for upload.
    async fn delete(&self, id: &str, rev: Revision) -> Result<(), RemoteError>;
}

/// Callbacks the engine invokes while syncing.
#[async_trait]
pub trait SyncHooks: Send + Sync {
    async fn on_get(&self, id: &str) -> BridgeResult<Option<Document>>;

    async fn on_put(&self, doc: Document) -> BridgeResult<Revision>;

    async fn on_delete(&self, id: &str, rev: Revision) -> BridgeResult<()>;

    /// Called once per drive before its first pass, to queue every local document.
    async fn on_first_sync(&self, engine: &dyn SyncEngine) -> BridgeResult<()>;

    async fn on_progress(&self, drive: &Drive, event: ProgressEvent);

    fn compare_revision(&self, a: Revision, b: Revision) -> Ordering;

    /// Persisted engine state for `drive`, if any.
    async fn get_state(&self, drive: &Drive) -> BridgeResult<Option<serde_json::Value>>;

    async fn set_state(&self, drive: &Drive, state: serde_json::Value) -> BridgeResult<()>;
}

/// Builds the engine once the orchestrator's hooks exist.
pub trait SyncEngineFactory: Send + Sync {
    fn create(&self, hooks: Arc<dyn SyncHooks>) -> Arc<dyn SyncEngine>;
}

impl<F> SyncEngineFactory for F
where
    F: Fn(Arc<dyn SyncHooks>) -> Arc<dyn SyncEngine> + Send + Sync,
{
    fn create(&self, hooks: Arc<dyn SyncHooks>) -> Arc<dyn SyncEngine> {
        self(hooks)
    }
}
