//! Credential capabilities consumed by the sync core and supplied by the host.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AccessToken, ProviderKind, TokenGrant};

/// Source of bearer tokens for cloud drives.
///
/// `get_token(kind, false)` must never prompt the user; when no valid
/// credential exists it fails with [`AuthError::AuthRequired`](crate::AuthError::AuthRequired).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a token, prompting the user only when `interactive` is set.
    async fn get_token(&self, kind: ProviderKind, interactive: bool) -> Result<AccessToken>;

    /// Forget and revoke any credential held for `kind`.
    ///
    /// Revoking a provider that holds no credential succeeds.
    async fn revoke_token(&self, kind: ProviderKind) -> Result<()>;
}

/// Host-side OAuth flow for one or more providers.
///
/// Implementations own the browser/web-auth interaction and the provider
/// token endpoints. [`TokenManager`](crate::TokenManager) adds caching and
/// event emission on top.
#[async_trait]
pub trait AuthFlow: Send + Sync {
    /// Run the interactive authorization flow.
    async fn authorize(&self, kind: ProviderKind) -> Result<TokenGrant>;

    /// Obtain a token without user interaction.
    ///
    /// Returns `Ok(None)` when the provider has no session to refresh.
    async fn refresh(&self, kind: ProviderKind) -> Result<Option<TokenGrant>>;

    /// Revoke `token` with the provider, or drop the provider session when
    /// no token is cached.
    async fn revoke(&self, kind: ProviderKind, token: Option<AccessToken>) -> Result<()>;
}
