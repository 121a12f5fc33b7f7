//! In-memory fakes of the host bridges shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::background::{BackgroundExecutor, TaskHandler, TaskId, TaskStatus};
use bridge_traits::badge::{Badge, BadgeIndicator};
use bridge_traits::documents::{Document, DocumentRef, DocumentStore, Revision};
use bridge_traits::error::{BridgeError, RemoteError, Result as BridgeResult};
use bridge_traits::storage::{PreferenceChange, PreferenceStore, SettingsStore};
use core_auth::{AccessToken, AuthError, ProviderKind, TokenProvider};
use core_runtime::config::SyncConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_sync::{
    ConnectionState, Drive, ProgressEvent, SyncBridges, SyncEngine, SyncHooks, SyncManager,
    SyncStatus,
};
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Preferences
// ============================================================================

pub struct FakePreferences {
    values: Mutex<HashMap<String, String>>,
    tx: broadcast::Sender<PreferenceChange>,
}

impl FakePreferences {
    pub fn new(enabled: &str) -> Self {
        let (tx, _) = broadcast::channel(32);
        let mut values = HashMap::new();
        values.insert("sync.enabled".to_string(), enabled.to_string());
        Self {
            values: Mutex::new(values),
            tx,
        }
    }

    pub fn enabled(&self) -> Option<String> {
        self.values.lock().unwrap().get("sync.enabled").cloned()
    }
}

#[async_trait]
impl PreferenceStore for FakePreferences {
    async fn ready(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
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

// ============================================================================
// Settings
// ============================================================================

#[derive(Default)]
pub struct FakeSettings {
    pub values: Mutex<BTreeMap<String, String>>,
    pub fail_delete: AtomicBool,
}

impl FakeSettings {
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for FakeSettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("storage locked".to_string()));
        }
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        Ok(self.values.lock().unwrap().keys().cloned().collect())
    }

    async fn clear_all(&self) -> BridgeResult<()> {
        self.values.lock().unwrap().clear();
        Ok(())
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Default)]
pub struct FakeDocuments {
    pub docs: Mutex<BTreeMap<String, Document>>,
}

impl FakeDocuments {
    pub fn insert(&self, id: &str, rev: Revision) {
        self.docs.lock().unwrap().insert(
            id.to_string(),
            Document {
                id: id.to_string(),
                rev,
                body: serde_json::Map::new(),
            },
        );
    }
}

#[async_trait]
impl DocumentStore for FakeDocuments {
    async fn get_all(&self) -> BridgeResult<Vec<DocumentRef>> {
        Ok(self.docs.lock().unwrap().values().map(Document::to_ref).collect())
    }

    async fn get_by_id(&self, id: &str) -> BridgeResult<Option<Document>> {
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }

    async fn put_by_id(&self, doc: Document) -> BridgeResult<Revision> {
        let rev = doc.rev;
        self.docs.lock().unwrap().insert(doc.id.clone(), doc);
        Ok(rev)
    }

    async fn delete_by_id(&self, id: &str, _rev: Revision) -> BridgeResult<()> {
        self.docs.lock().unwrap().remove(id);
        Ok(())
    }
}

// ============================================================================
// Timer
// ============================================================================

#[derive(Default)]
pub struct FakeExecutor {
    handlers: Mutex<HashMap<String, TaskHandler>>,
    scheduled: Mutex<HashMap<String, (Duration, Duration)>>,
    pub schedule_calls: AtomicUsize,
}

impl FakeExecutor {
    /// Delay and period of the live timer named `name`.
    pub fn armed(&self, name: &str) -> Option<(Duration, Duration)> {
        self.scheduled.lock().unwrap().get(name).copied()
    }

    /// Run the registered handler as if the timer had fired.
    pub async fn fire(&self, name: &str) {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .expect("handler registered");
        handler().await.unwrap();
    }
}

#[async_trait]
impl BackgroundExecutor for FakeExecutor {
    async fn register_task_handler(&self, task_id: &str, handler: TaskHandler) -> BridgeResult<()> {
        self.handlers
            .lock()
            .unwrap()
            .insert(task_id.to_string(), handler);
        Ok(())
    }

    async fn schedule_task(
        &self,
        task_id: &str,
        delay: Duration,
        period: Duration,
    ) -> BridgeResult<TaskId> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.scheduled
            .lock()
            .unwrap()
            .insert(task_id.to_string(), (delay, period));
        Ok(TaskId::new(task_id))
    }

    async fn cancel_task(&self, task_id: &TaskId) -> BridgeResult<()> {
        self.scheduled.lock().unwrap().remove(task_id.as_str());
        Ok(())
    }

    async fn get_task_status(&self, task_id: &TaskId) -> BridgeResult<TaskStatus> {
        if self.scheduled.lock().unwrap().contains_key(task_id.as_str()) {
            Ok(TaskStatus::Scheduled)
        } else {
            Ok(TaskStatus::Cancelled)
        }
    }

    async fn list_tasks(&self) -> BridgeResult<Vec<TaskId>> {
        Ok(self
            .scheduled
            .lock()
            .unwrap()
            .keys()
            .map(TaskId::new)
            .collect())
    }

    async fn next_execution_time(&self, task_id: &TaskId) -> BridgeResult<Option<Duration>> {
        Ok(self.armed(task_id.as_str()).map(|(delay, _)| delay))
    }
}

// ============================================================================
// Badge
// ============================================================================

#[derive(Default)]
pub struct FakeBadge {
    pub history: Mutex<Vec<Option<Badge>>>,
}

impl FakeBadge {
    pub fn current(&self) -> Option<Badge> {
        self.history.lock().unwrap().last().cloned().flatten()
    }
}

impl BadgeIndicator for FakeBadge {
    fn set_badge(&self, badge: Option<Badge>) {
        self.history.lock().unwrap().push(badge);
    }
}

// ============================================================================
// Credentials
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    Get(ProviderKind, bool),
    Revoke(ProviderKind),
}

pub struct FakeTokens {
    pub interactive_ok: AtomicBool,
    pub silent_ok: AtomicBool,
    pub revoke_fails: AtomicBool,
    pub calls: Mutex<Vec<TokenCall>>,
    pub interactive_gate: Mutex<Option<Arc<PassGate>>>,
}

impl Default for FakeTokens {
    fn default() -> Self {
        Self {
            interactive_ok: AtomicBool::new(true),
            silent_ok: AtomicBool::new(true),
            revoke_fails: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            interactive_gate: Mutex::new(None),
        }
    }
}

impl FakeTokens {
    pub fn calls(&self) -> Vec<TokenCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Hold interactive sign-ins until the returned gate is released.
    pub fn pause_interactive(&self) -> Arc<PassGate> {
        let gate = Arc::new(PassGate::new());
        *self.interactive_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl TokenProvider for FakeTokens {
    async fn get_token(&self, kind: ProviderKind, interactive: bool) -> core_auth::Result<AccessToken> {
        self.calls
            .lock()
            .unwrap()
            .push(TokenCall::Get(kind, interactive));
        if interactive {
            let gate = self.interactive_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        let ok = if interactive {
            self.interactive_ok.load(Ordering::SeqCst)
        } else {
            self.silent_ok.load(Ordering::SeqCst)
        };
        if ok {
            Ok(AccessToken::new(format!("{}-token", kind)))
        } else if interactive {
            Err(AuthError::AuthenticationFailed {
                provider: kind.to_string(),
                reason: "user closed the window".to_string(),
            })
        } else {
            Err(AuthError::AuthRequired {
                provider: kind.to_string(),
            })
        }
    }

    async fn revoke_token(&self, kind: ProviderKind) -> core_auth::Result<()> {
        self.calls.lock().unwrap().push(TokenCall::Revoke(kind));
        if self.revoke_fails.load(Ordering::SeqCst) {
            return Err(AuthError::RevocationFailed {
                provider: kind.to_string(),
                reason: "network down".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Blocks `sync_now` until released, to interleave operations with a pass.
pub struct PassGate {
    pub entered: Notify,
    pub release: Notify,
}

impl PassGate {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeEngine {
    hooks: Mutex<Option<Arc<dyn SyncHooks>>>,
    drive: Mutex<Option<Drive>>,
    pub calls: Mutex<Vec<String>>,
    pub results: Mutex<VecDeque<Result<(), RemoteError>>>,
    pub emit_progress: AtomicBool,
    pub fail_uninit: AtomicBool,
    pub pass_gate: Mutex<Option<Arc<PassGate>>>,
}

impl FakeEngine {
    pub fn hooks(&self) -> Arc<dyn SyncHooks> {
        self.hooks.lock().unwrap().clone().expect("hooks installed")
    }

    pub fn drive(&self) -> Option<Drive> {
        self.drive.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Make the next pass fail with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// Hold the next passes until the returned gate is released.
    pub fn pause_passes(&self) -> Arc<PassGate> {
        let gate = Arc::new(PassGate::new());
        *self.pass_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SyncEngine for FakeEngine {
    fn use_drive(&self, drive: Drive) {
        self.record(format!("use_drive:{}", drive.name()));
        *self.drive.lock().unwrap() = Some(drive);
    }

    async fn init(&self) -> Result<(), RemoteError> {
        self.record("init".to_string());
        Ok(())
    }

    async fn uninit(&self) -> Result<(), RemoteError> {
        self.record("uninit".to_string());
        if self.fail_uninit.load(Ordering::SeqCst) {
            return Err(RemoteError::other("uninit exploded"));
        }
        Ok(())
    }

    async fn sync_now(&self) -> Result<(), RemoteError> {
        self.record("sync_now".to_string());

        let gate = self.pass_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.emit_progress.load(Ordering::SeqCst) {
            let drive = self.drive().expect("drive bound");
            let hooks = self.hooks();
            hooks.on_progress(&drive, ProgressEvent::start()).await;
            let mut detail = serde_json::Map::new();
            detail.insert("loaded".to_string(), serde_json::json!(1));
            hooks.on_progress(&drive, ProgressEvent::progress(detail)).await;
            hooks.on_progress(&drive, ProgressEvent::end()).await;
        }

        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn put(&self, id: &str, rev: Revision) -> Result<(), RemoteError> {
        self.record(format!("put:{}:{}", id, rev));
        Ok(())
    }

    async fn delete(&self, id: &str, rev: Revision) -> Result<(), RemoteError> {
        self.record(format!("delete:{}:{}", id, rev));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub manager: Arc<SyncManager>,
    pub bus: EventBus,
    pub prefs: Arc<FakePreferences>,
    pub settings: Arc<FakeSettings>,
    pub documents: Arc<FakeDocuments>,
    pub executor: Arc<FakeExecutor>,
    pub badge: Arc<FakeBadge>,
    pub tokens: Arc<FakeTokens>,
    pub engine: Arc<FakeEngine>,
}

pub fn test_config() -> SyncConfig {
    SyncConfig::default()
        .with_sync_delay(Duration::from_secs(60))
        .with_sync_interval(Duration::from_secs(1800))
}

impl Harness {
    /// Build a manager whose enabled-drive preference starts at `enabled`.
    pub fn build(enabled: &str) -> Self {
        Self::build_with(enabled, FakeTokens::default())
    }

    pub fn build_with(enabled: &str, tokens: FakeTokens) -> Self {
        let bus = EventBus::new(256);
        let prefs = Arc::new(FakePreferences::new(enabled));
        let settings = Arc::new(FakeSettings::default());
        let documents = Arc::new(FakeDocuments::default());
        let executor = Arc::new(FakeExecutor::default());
        let badge = Arc::new(FakeBadge::default());
        let tokens = Arc::new(tokens);
        let engine = Arc::new(FakeEngine::default());

        let factory = {
            let engine = engine.clone();
            move |hooks: Arc<dyn SyncHooks>| -> Arc<dyn SyncEngine> {
                *engine.hooks.lock().unwrap() = Some(hooks);
                engine.clone()
            }
        };

        let bridges = SyncBridges {
            preferences: prefs.clone(),
            settings: settings.clone(),
            documents: documents.clone(),
            executor: executor.clone(),
            badge: badge.clone(),
        };

        let manager =
            SyncManager::new(test_config(), bridges, tokens.clone(), bus.clone(), &factory)
                .expect("valid config");

        Self {
            manager,
            bus,
            prefs,
            settings,
            documents,
            executor,
            badge,
            tokens,
            engine,
        }
    }

    /// Build and initialize with no drive enabled.
    pub async fn ready() -> Self {
        let harness = Self::build("none");
        harness.manager.initialize().await.unwrap();
        harness
    }

    pub fn status_stream(&self) -> EventStream {
        EventStream::status_updates(self.bus.subscribe())
    }

    /// Wait until the manager reaches `state`, failing after two seconds.
    pub async fn wait_for_state(&self, state: ConnectionState) -> SyncStatus {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let status = self.manager.status().await;
            if status.state == state {
                return status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {state}, last status {status:?}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Status payloads of every queued status update.
pub fn statuses(stream: &mut EventStream) -> Vec<SyncStatus> {
    stream
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::SyncStatusUpdate { status } => Some(status),
            _ => None,
        })
        .collect()
}
