//! Drive handles and the factory that creates them.

use std::fmt;
use std::sync::Arc;

use core_auth::{AccessToken, AuthError, ProviderKind, TokenProvider};
use futures::future::BoxFuture;

use crate::error::{Result, SyncError};

/// Credential-retrieval capability bound to one provider.
pub type CredentialSource =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<AccessToken, AuthError>> + Send + Sync>;

/// Handle to the cloud drive currently bound to the sync engine.
///
/// `epoch` identifies the binding: callbacks carrying a drive whose epoch is
/// no longer current belong to a torn-down binding and are ignored.
#[derive(Clone)]
pub struct Drive {
    kind: ProviderKind,
    epoch: u64,
    credentials: CredentialSource,
}

impl Drive {
    pub fn new(kind: ProviderKind, epoch: u64, credentials: CredentialSource) -> Self {
        Self {
            kind,
            epoch,
            credentials,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Provider identifier, also used in storage keys.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Fetch a token without prompting the user.
    pub async fn access_token(&self) -> std::result::Result<AccessToken, AuthError> {
        (self.credentials)().await
    }
}

impl fmt::Debug for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drive")
            .field("kind", &self.kind)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Builds [`Drive`] handles for the supported providers.
pub struct DriveFactory {
    tokens: Arc<dyn TokenProvider>,
}

impl DriveFactory {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self { tokens }
    }

    /// Resolve `name` to a drive whose credentials come from the token provider.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownProvider`] for any name outside the supported set.
    pub fn create(&self, name: &str, epoch: u64) -> Result<Drive> {
        let kind =
            ProviderKind::parse(name).ok_or_else(|| SyncError::UnknownProvider(name.to_string()))?;

        let tokens = self.tokens.clone();
        let credentials: CredentialSource = Arc::new(move || {
            let tokens = tokens.clone();
            Box::pin(async move { tokens.get_token(kind, false).await })
        });

        Ok(Drive::new(kind, epoch, credentials))
    }
}
