//! # Token Manager
//!
//! Caching credential manager layered over a host [`AuthFlow`].
//!
//! ## Overview
//!
//! The `TokenManager` is the [`TokenProvider`] the sync core talks to. It keeps
//! one token per provider, serves it while it is fresh, refreshes silently when
//! it is about to expire and only falls back to the interactive flow when the
//! caller allows it. Credential lifecycle changes are emitted on the
//! application's event bus.
//!
//! ## Features
//!
//! - Per-provider token cache with a refresh buffer before expiry
//! - Silent refresh before interactive authorization
//! - Concurrent refresh protection (one flow per provider at a time)
//! - Idempotent revocation
//! - Event emission for auth state changes
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{AuthFlow, ProviderKind, TokenManager, TokenProvider};
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//!
//! # async fn run(flow: Arc<dyn AuthFlow>) -> core_auth::Result<()> {
//! let manager = TokenManager::new(flow, EventBus::new(100));
//!
//! // Prompts the user if no token can be refreshed silently
//! let token = manager.get_token(ProviderKind::Dropbox, true).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::provider::{AuthFlow, TokenProvider};
use crate::types::{AccessToken, ProviderKind, TokenGrant};
use async_trait::async_trait;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventSeverity};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Buffer time before token expiration to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Caching [`TokenProvider`] backed by a host [`AuthFlow`].
pub struct TokenManager {
    /// Host OAuth flow
    flow: Arc<dyn AuthFlow>,
    /// Event bus for emitting auth events
    event_bus: EventBus,
    /// Current grant per provider
    cache: RwLock<HashMap<ProviderKind, TokenGrant>>,
    /// Token refresh locks to prevent concurrent flows for one provider
    refresh_locks: Mutex<HashMap<ProviderKind, Arc<Mutex<()>>>>,
}

impl TokenManager {
    /// Creates a new token manager.
    ///
    /// # Arguments
    ///
    /// * `flow` - Host-provided OAuth flow
    /// * `event_bus` - Event bus for emitting authentication events
    pub fn new(flow: Arc<dyn AuthFlow>, event_bus: EventBus) -> Self {
        Self {
            flow,
            event_bus,
            cache: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a token that is not about to expire is cached for `kind`.
    pub async fn has_valid_token(&self, kind: ProviderKind) -> bool {
        self.cached(kind).await.is_some()
    }

    async fn cached(&self, kind: ProviderKind) -> Option<AccessToken> {
        let cache = self.cache.read().await;
        cache
            .get(&kind)
            .filter(|grant| !grant.is_expired_with_buffer(TOKEN_REFRESH_BUFFER.as_secs() as i64))
            .map(|grant| grant.access_token.clone())
    }

    async fn refresh_lock(&self, kind: ProviderKind) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(kind)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn store(&self, kind: ProviderKind, grant: TokenGrant) -> AccessToken {
        let token = grant.access_token.clone();
        self.cache.write().await.insert(kind, grant);
        token
    }

    fn emit_error(&self, kind: ProviderKind, error: &AuthError) {
        let event = CoreEvent::Auth(AuthEvent::AuthError {
            provider: kind.to_string(),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
        self.publish(event);
    }

    /// Log `event` at its severity and broadcast it.
    fn publish(&self, event: CoreEvent) {
        let description = event.description();
        match event.severity() {
            EventSeverity::Error => error!(event = description, "Auth event"),
            EventSeverity::Warning => warn!(event = description, "Auth event"),
            EventSeverity::Info => info!(event = description, "Auth event"),
            EventSeverity::Debug => debug!(event = description, "Auth event"),
        }
        let _ = self.event_bus.emit(event);
    }

    async fn acquire(&self, kind: ProviderKind, interactive: bool) -> Result<AccessToken> {
        match self.flow.refresh(kind).await {
            Ok(Some(grant)) => {
                debug!("Token refreshed silently");
                return Ok(self.store(kind, grant).await);
            }
            Ok(None) => debug!("No session to refresh"),
            Err(e) if interactive => warn!(error = %e, "Silent refresh failed"),
            Err(e) => return Err(e),
        }

        if !interactive {
            return Err(AuthError::AuthRequired {
                provider: kind.to_string(),
            });
        }

        info!("Starting interactive authorization");
        let grant = self.flow.authorize(kind).await?;
        let token = self.store(kind, grant).await;

        let event = CoreEvent::Auth(AuthEvent::SignedIn {
            provider: kind.to_string(),
        });
        self.publish(event);
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    #[instrument(skip(self), fields(provider = %kind))]
    async fn get_token(&self, kind: ProviderKind, interactive: bool) -> Result<AccessToken> {
        if let Some(token) = self.cached(kind).await {
            return Ok(token);
        }

        let lock = self.refresh_lock(kind).await;
        let _guard = lock.lock().await;

        // Another caller may have finished a flow while we waited.
        if let Some(token) = self.cached(kind).await {
            return Ok(token);
        }

        self.acquire(kind, interactive).await.inspect_err(|e| {
            warn!(error = %e, "Failed to obtain token");
            self.emit_error(kind, e);
        })
    }

    #[instrument(skip(self), fields(provider = %kind))]
    async fn revoke_token(&self, kind: ProviderKind) -> Result<()> {
        let removed = self.cache.write().await.remove(&kind);
        let had_token = removed.is_some();

        self.flow
            .revoke(kind, removed.map(|grant| grant.access_token))
            .await?;

        if had_token {
            let event = CoreEvent::Auth(AuthEvent::SignedOut {
                provider: kind.to_string(),
            });
            self.publish(event);
        } else {
            debug!("No cached token to revoke");
        }

        Ok(())
    }
}
