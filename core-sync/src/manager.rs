//! # Sync Manager
//!
//! Background orchestrator keeping the local document collection in sync with
//! one user-selected cloud drive.
//!
//! ## Overview
//!
//! The `SyncManager` owns the connection lifecycle:
//!
//! ```text
//!                 start                 first pass done
//!  Disconnected ─────────> Connecting ───────────────────> Connected
//!       ^                      │                               │
//!       │                      │ login failed / stop           │ stop
//!       │                      v                               v
//!       └──────────────── Disconnecting <──────────────────────┘
//! ```
//!
//! It binds a [`Drive`] to the sync engine, schedules recurring passes through
//! the host timer, tracks credential validity and publishes a
//! [`SyncStatus`] snapshot after every observable change.
//!
//! ## Readiness
//!
//! Until [`initialize`](SyncManager::initialize) has replayed the persisted
//! enabled-drive preference, every public operation waits. Afterwards the
//! manager follows preference changes on its own.
//!
//! ## Stale callbacks
//!
//! Each binding gets a fresh epoch. Pass results, progress events and state
//! writes carrying an older epoch are dropped, so a pass still running when
//! the drive is stopped cannot resurrect its status or persisted state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncBridges, SyncManager};
//!
//! let manager = SyncManager::new(config, bridges, tokens, event_bus, &engine_factory)?;
//! manager.initialize().await?;
//!
//! manager.start("dropbox").await?;
//! manager.put("style-1", 42).await?;
//! println!("{:?}", manager.status().await);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::background::{BackgroundExecutor, TaskHandler};
use bridge_traits::badge::BadgeIndicator;
use bridge_traits::documents::{DocumentStore, Revision};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{PreferenceChange, PreferenceStore, SettingsStore};
use core_auth::{ProviderKind, TokenProvider};
use core_runtime::config::{SyncConfig, DRIVE_NONE};
use core_runtime::events::{CoreEvent, EventBus, EventStream, Receiver, RecvError};
use futures::future::BoxFuture;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::classifier::{classify, ErrorClass};
use crate::drive::{Drive, DriveFactory};
use crate::engine::{SyncEngine, SyncEngineFactory, SyncHooks};
use crate::error::{Result, SyncError};
use crate::hooks::ManagerHooks;
use crate::readiness::ReadinessGate;
use crate::scheduler::Scheduler;
use crate::status::{ConnectionState, ProgressEvent, ProgressPhase, StatusBroadcaster, SyncStatus};

/// Host capabilities the manager depends on.
#[derive(Clone)]
pub struct SyncBridges {
    /// User preferences, holding the enabled drive
    pub preferences: Arc<dyn PreferenceStore>,
    /// Local storage for persisted engine state
    pub settings: Arc<dyn SettingsStore>,
    /// Local document collection
    pub documents: Arc<dyn DocumentStore>,
    /// Timer facility
    pub executor: Arc<dyn BackgroundExecutor>,
    /// Sync-health badge
    pub badge: Arc<dyn BadgeIndicator>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrive {
    kind: ProviderKind,
    epoch: u64,
}

#[derive(Debug, Default)]
struct Inner {
    status: SyncStatus,
    last_error: Option<ErrorClass>,
    drive: Option<ActiveDrive>,
    epoch: u64,
}

impl Inner {
    /// Whether `epoch` is the live binding and not being torn down.
    fn is_current(&self, epoch: u64) -> bool {
        matches!(self.drive, Some(drive) if drive.epoch == epoch)
            && self.status.state != ConnectionState::Disconnecting
    }

    fn record_failure(&mut self, error: &SyncError) -> ErrorClass {
        let class = classify(error);
        self.status.error_message = Some(error.to_string());
        self.last_error = Some(class);
        class
    }
}

/// Connection state machine and public API of the sync core.
pub struct SyncManager {
    config: SyncConfig,
    gate: ReadinessGate,
    preferences: Arc<dyn PreferenceStore>,
    settings: Arc<dyn SettingsStore>,
    documents: Arc<dyn DocumentStore>,
    tokens: Arc<dyn TokenProvider>,
    drives: DriveFactory,
    engine: Arc<dyn SyncEngine>,
    scheduler: Scheduler,
    broadcaster: StatusBroadcaster,
    /// Status, last error and binding; never held across a collaborator await
    inner: Mutex<Inner>,
    /// Serializes persisted-state writes with their deletion on stop
    state_io: Mutex<()>,
    /// Enabled-drive values written by the manager itself, not yet seen by
    /// the preference listener
    own_writes: Mutex<Vec<String>>,
    initialized: AtomicBool,
}

impl SyncManager {
    /// Create a manager and its sync engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Sync configuration, validated here
    /// * `bridges` - Host capabilities
    /// * `tokens` - Credential provider for all drives
    /// * `event_bus` - Bus carrying status updates
    /// * `engine_factory` - Builds the engine from the manager's hooks
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] if the configuration is invalid.
    pub fn new(
        config: SyncConfig,
        bridges: SyncBridges,
        tokens: Arc<dyn TokenProvider>,
        event_bus: EventBus,
        engine_factory: &dyn SyncEngineFactory,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        Ok(Arc::new_cyclic(|weak| {
            let hooks: Arc<dyn SyncHooks> = Arc::new(ManagerHooks::new(weak.clone()));
            let engine = engine_factory.create(hooks);

            Self {
                scheduler: Scheduler::new(bridges.executor, &config),
                broadcaster: StatusBroadcaster::new(event_bus, bridges.badge),
                drives: DriveFactory::new(tokens.clone()),
                config,
                gate: ReadinessGate::new(),
                preferences: bridges.preferences,
                settings: bridges.settings,
                documents: bridges.documents,
                tokens,
                engine,
                inner: Mutex::new(Inner::default()),
                state_io: Mutex::new(()),
                own_writes: Mutex::new(Vec::new()),
                initialized: AtomicBool::new(false),
            }
        }))
    }

    /// Register the timer, replay the enabled-drive preference and open the
    /// readiness gate. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the timer cannot be registered or preferences cannot be read;
    /// the gate stays closed and `initialize` may be retried.
    #[instrument(skip(self))]
    pub async fn initialize(self: &Arc<Self>) -> Result<()> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            debug!("Already initialized");
            return Ok(());
        }

        let result = self.initialize_inner().await;
        if result.is_err() {
            self.initialized.store(false, Ordering::Release);
        }
        result
    }

    async fn initialize_inner(self: &Arc<Self>) -> Result<()> {
        self.scheduler.register(self.timer_handler()).await?;
        self.preferences.ready().await?;

        // Subscribe before reading so no change between the two is lost.
        let changes = self.preferences.subscribe();
        let enabled = self.enabled_preference().await?;
        info!(enabled = %enabled, "Replaying enabled drive preference");
        self.apply_preference(&enabled).await;

        self.spawn_preference_listener(changes);
        self.gate.open();
        info!("Sync manager ready");
        Ok(())
    }

    /// Snapshot of the current status.
    pub async fn status(&self) -> SyncStatus {
        self.inner.lock().await.status.clone()
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.broadcaster.event_bus().subscribe()
    }

    /// Receive status updates only.
    pub fn status_updates(&self) -> EventStream {
        EventStream::status_updates(self.subscribe())
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Bind `provider_name`, sign in interactively and run the first pass.
    ///
    /// A no-op while another drive is bound. A failed sign-in is recorded in
    /// the status and unbinds the drive; it is not returned as an error.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownProvider`] if the name is not a supported drive.
    pub async fn start(&self, provider_name: &str) -> Result<()> {
        self.gate.wait().await;
        self.start_inner(provider_name, false).await
    }

    /// Unbind the current drive, revoking its credential and forgetting its
    /// persisted state. Every teardown failure is logged and swallowed.
    pub async fn stop(&self) {
        self.gate.wait().await;
        self.stop_inner().await;
    }

    /// Run one sync pass now.
    ///
    /// Engine failures are recorded in the status, not returned.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotConnected`] when no drive is bound or the credential is
    /// known to be invalid.
    pub async fn sync_now(&self) -> Result<()> {
        self.gate.wait().await;
        self.sync_now_inner().await
    }

    /// Re-authenticate interactively, discarding any current credential.
    ///
    /// `provider_name` defaults to the enabled-drive preference.
    pub async fn login(&self, provider_name: Option<&str>) -> Result<()> {
        self.gate.wait().await;
        let name = match provider_name {
            Some(name) => name.to_string(),
            None => self.enabled_preference().await?,
        };
        let kind = ProviderKind::parse(&name).ok_or(SyncError::UnknownProvider(name))?;
        self.login_inner(kind, None).await
    }

    /// Forward a local modification to the engine and schedule a pass soon.
    ///
    /// A no-op while no drive is bound.
    pub async fn put(&self, id: &str, rev: Revision) -> Result<()> {
        self.gate.wait().await;
        if !self.has_drive().await {
            trace!(id, "No drive bound, ignoring put");
            return Ok(());
        }
        self.arm_after_write().await;
        self.engine.put(id, rev).await?;
        Ok(())
    }

    /// Forward a local deletion to the engine and schedule a pass soon.
    ///
    /// A no-op while no drive is bound.
    pub async fn delete(&self, id: &str, rev: Revision) -> Result<()> {
        self.gate.wait().await;
        if !self.has_drive().await {
            trace!(id, "No drive bound, ignoring delete");
            return Ok(());
        }
        self.arm_after_write().await;
        self.engine.delete(id, rev).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------

    #[instrument(skip(self), fields(provider = %name))]
    async fn start_inner(&self, name: &str, from_preference: bool) -> Result<()> {
        let drive = {
            let mut inner = self.inner.lock().await;
            if inner.drive.is_some() {
                debug!("A drive is already bound");
                return Ok(());
            }

            let epoch = inner.epoch + 1;
            let drive = self.drives.create(name, epoch)?;
            inner.epoch = epoch;
            inner.drive = Some(ActiveDrive {
                kind: drive.kind(),
                epoch,
            });
            self.engine.use_drive(drive.clone());

            inner.status.state = ConnectionState::Connecting;
            inner.status.current_drive_name = Some(drive.name().to_string());
            self.publish(&inner);
            drive
        };
        let (kind, epoch) = (drive.kind(), drive.epoch());
        info!(epoch, "Drive bound");

        if from_preference {
            let login = match self.tokens.get_token(kind, false).await {
                Ok(_) => true,
                Err(e) => {
                    info!(error = %e, "No usable credential, passes wait for login");
                    false
                }
            };
            let mut inner = self.inner.lock().await;
            if !inner.is_current(epoch) {
                return Ok(());
            }
            inner.status.login = login;
            self.publish(&inner);
        } else if let Err(e) = self.login_inner(kind, Some(epoch)).await {
            error!(error = %e, "Login failed, unbinding drive");
            {
                let mut inner = self.inner.lock().await;
                if !inner.is_current(epoch) {
                    return Ok(());
                }
                inner.record_failure(&e);
                self.publish(&inner);
            }
            self.stop_inner().await;
            return Ok(());
        }

        match self.sync_now_inner().await {
            Ok(()) => {}
            Err(SyncError::NotConnected) => info!("Skipping first pass until login"),
            Err(e) => warn!(error = %e, "First pass was refused"),
        }

        if !self.is_current(epoch).await {
            debug!("Drive was unbound during start");
            return Ok(());
        }

        if let Err(e) = self.write_enabled_preference(kind.as_str()).await {
            warn!(error = %e, "Failed to persist enabled drive");
        }
        if let Err(e) = self.scheduler.arm_periodic().await {
            warn!(error = %e, "Failed to arm sync timer");
        }

        let mut inner = self.inner.lock().await;
        if !inner.is_current(epoch) {
            // Unbound while the timer was being armed.
            let unbound = inner.drive.is_none();
            drop(inner);
            if unbound {
                self.scheduler.disarm().await;
            }
            return Ok(());
        }
        inner.status.state = ConnectionState::Connected;
        self.publish(&inner);
        info!("Drive connected");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop_inner(&self) {
        let kind = {
            let mut inner = self.inner.lock().await;
            let Some(drive) = inner.drive else {
                debug!("No drive bound");
                return;
            };
            if inner.status.state == ConnectionState::Disconnecting {
                debug!("Stop already in progress");
                return;
            }
            inner.status.state = ConnectionState::Disconnecting;
            self.publish(&inner);
            drive.kind
        };
        info!(provider = %kind, "Unbinding drive");

        self.scheduler.disarm().await;

        if let Err(e) = self.engine.uninit().await {
            warn!(error = %e, "Engine uninit failed");
        }
        if let Err(e) = self.tokens.revoke_token(kind).await {
            warn!(error = %e, "Token revocation failed");
        }
        {
            let _io = self.state_io.lock().await;
            let key = self.config.state_key(kind.as_str());
            if let Err(e) = self.settings.delete(&key).await {
                warn!(error = %e, key = %key, "Failed to delete persisted sync state");
            }
        }

        // Reset while still Disconnecting.
        if let Err(e) = self.write_enabled_preference(DRIVE_NONE).await {
            warn!(error = %e, "Failed to reset enabled drive");
        }

        {
            let mut inner = self.inner.lock().await;
            inner.drive = None;
            inner.epoch += 1;
            inner.status.state = ConnectionState::Disconnected;
            inner.status.current_drive_name = None;
            inner.status.login = false;
            inner.status.syncing = false;
            inner.status.progress = None;
            self.publish(&inner);
        }

        info!(provider = %kind, "Drive disconnected");
    }

    #[instrument(skip(self))]
    async fn sync_now_inner(&self) -> Result<()> {
        let epoch = {
            let inner = self.inner.lock().await;
            match inner.drive {
                Some(drive) if inner.status.login && inner.is_current(drive.epoch) => drive.epoch,
                _ => return Err(SyncError::NotConnected),
            }
        };

        debug!("Starting sync pass");
        let result = match self.engine.init().await {
            Ok(()) => self.engine.sync_now().await,
            Err(e) => Err(e),
        };

        let mut inner = self.inner.lock().await;
        if !inner.is_current(epoch) {
            debug!("Discarding pass result of an unbound drive");
            return Ok(());
        }

        match result {
            Ok(()) => {
                inner.status.error_message = None;
                inner.last_error = None;
                info!("Sync pass completed");
            }
            Err(e) => {
                let e = SyncError::from(e);
                let class = inner.record_failure(&e);
                warn!(error = %e, ?class, "Sync pass failed");
                if class == ErrorClass::GrantInvalid {
                    inner.status.login = false;
                }
            }
        }
        self.publish(&inner);
        Ok(())
    }

    /// Interactive sign-in. With `epoch`, the outcome is only recorded while
    /// that binding is still live.
    #[instrument(skip(self), fields(provider = %kind))]
    async fn login_inner(&self, kind: ProviderKind, epoch: Option<u64>) -> Result<()> {
        if let Err(e) = self.tokens.revoke_token(kind).await {
            warn!(error = %e, "Failed to revoke previous credential");
        }

        let result = self.tokens.get_token(kind, true).await;

        let mut inner = self.inner.lock().await;
        match epoch {
            Some(epoch) if !inner.is_current(epoch) => {
                debug!(epoch, "Discarding login result of an unbound drive");
            }
            _ => {
                inner.status.login = result.is_ok();
                self.publish(&inner);
            }
        }
        drop(inner);

        result?;
        info!("Login succeeded");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Preferences and timer
    // ------------------------------------------------------------------

    async fn enabled_preference(&self) -> Result<String> {
        Ok(self
            .preferences
            .get(&self.config.enabled_preference_key)
            .await?
            .unwrap_or_else(|| DRIVE_NONE.to_string()))
    }

    async fn apply_preference(&self, value: &str) {
        if value == DRIVE_NONE {
            self.stop_inner().await;
        } else if let Err(e) = self.start_inner(value, true).await {
            warn!(error = %e, value, "Ignoring enabled drive preference");
        }
    }

    /// Persist the enabled drive, remembering the write so the listener
    /// does not replay it.
    async fn write_enabled_preference(&self, value: &str) -> BridgeResult<()> {
        self.own_writes.lock().await.push(value.to_string());
        let result = self
            .preferences
            .set(&self.config.enabled_preference_key, value)
            .await;
        if result.is_err() {
            self.forget_own_write(value).await;
        }
        result
    }

    /// Consume a pending self-write of `value`; true if there was one.
    async fn forget_own_write(&self, value: &str) -> bool {
        let mut own_writes = self.own_writes.lock().await;
        match own_writes.iter().position(|written| written == value) {
            Some(index) => {
                own_writes.remove(index);
                true
            }
            None => false,
        }
    }

    fn spawn_preference_listener(self: &Arc<Self>, mut changes: broadcast::Receiver<PreferenceChange>) {
        let manager = Arc::downgrade(self);
        let key = self.config.enabled_preference_key.clone();

        tokio::spawn(async move {
            loop {
                let change = changes.recv().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };

                let value = match change {
                    Ok(change) if change.key != key => continue,
                    Ok(change) => {
                        if manager.forget_own_write(&change.value).await {
                            trace!(value = %change.value, "Skipping own preference write");
                            continue;
                        }
                        change.value
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Own writes among the skipped events can no longer be matched.
                        debug!(skipped, "Preference listener lagged, re-reading");
                        manager.own_writes.lock().await.clear();
                        match manager.enabled_preference().await {
                            Ok(value) => value,
                            Err(e) => {
                                warn!(error = %e, "Failed to read enabled drive preference");
                                continue;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                info!(value = %value, "Enabled drive preference changed");
                manager.apply_preference(&value).await;
            }
            debug!("Preference listener stopped");
        });
    }

    fn timer_handler(self: &Arc<Self>) -> TaskHandler {
        let manager = Arc::downgrade(self);
        Arc::new(move || -> BoxFuture<'static, BridgeResult<()>> {
            let manager = manager.clone();
            Box::pin(async move {
                let Some(manager) = manager.upgrade() else {
                    return Ok(());
                };
                match manager.sync_now_inner().await {
                    Ok(()) => {}
                    Err(SyncError::NotConnected) => debug!("Timer fired while disconnected"),
                    Err(e) => warn!(error = %e, "Scheduled pass failed"),
                }
                Ok(())
            })
        })
    }

    async fn arm_after_write(&self) {
        if let Err(e) = self.scheduler.arm_after_write().await {
            warn!(error = %e, "Failed to arm sync timer");
        }
    }

    // ------------------------------------------------------------------
    // Hook support
    // ------------------------------------------------------------------

    pub(crate) fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub(crate) async fn apply_progress(&self, epoch: u64, event: ProgressEvent) {
        let mut inner = self.inner.lock().await;
        if !inner.is_current(epoch) {
            trace!(epoch, "Dropping progress of an unbound drive");
            return;
        }
        match event.phase {
            ProgressPhase::Start => inner.status.syncing = true,
            ProgressPhase::End => {
                inner.status.syncing = false;
                inner.status.progress = None;
            }
            ProgressPhase::Progress => inner.status.progress = Some(event),
        }
        self.publish(&inner);
    }

    pub(crate) async fn load_drive_state(
        &self,
        drive: &Drive,
    ) -> BridgeResult<Option<serde_json::Value>> {
        if !self.is_current(drive.epoch()).await {
            return Ok(None);
        }
        let raw = self
            .settings
            .get_string(&self.config.state_key(drive.name()))
            .await?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(BridgeError::from))
            .transpose()
    }

    pub(crate) async fn save_drive_state(
        &self,
        drive: &Drive,
        state: serde_json::Value,
    ) -> BridgeResult<()> {
        let _io = self.state_io.lock().await;
        if !self.is_current(drive.epoch()).await {
            debug!(epoch = drive.epoch(), "Dropping state write of an unbound drive");
            return Ok(());
        }
        self.settings
            .set_string(&self.config.state_key(drive.name()), &state.to_string())
            .await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn has_drive(&self) -> bool {
        self.inner.lock().await.drive.is_some()
    }

    async fn is_current(&self, epoch: u64) -> bool {
        self.inner.lock().await.is_current(epoch)
    }

    fn publish(&self, inner: &Inner) {
        self.broadcaster.publish(&inner.status, inner.last_error);
    }
}
