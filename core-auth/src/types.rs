use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Supported cloud storage providers.
///
/// The set is closed: every drive the sync core can bind to is listed here,
/// and the identifier strings are the values persisted in preferences.
///
/// # Examples
///
/// ```
/// use core_auth::ProviderKind;
///
/// let provider = ProviderKind::Google;
/// assert_eq!(provider.display_name(), "Google Drive");
/// assert_eq!(provider.as_str(), "google");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Dropbox
    Dropbox,
    /// Google Drive
    Google,
    /// Microsoft OneDrive
    OneDrive,
}

impl ProviderKind {
    /// Every supported provider, in display order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Dropbox,
        ProviderKind::Google,
        ProviderKind::OneDrive,
    ];

    /// Get the human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Dropbox => "Dropbox",
            ProviderKind::Google => "Google Drive",
            ProviderKind::OneDrive => "OneDrive",
        }
    }

    /// Get the provider identifier string
    ///
    /// Used for logging, preference values and storage keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::OneDrive.as_str(), "onedrive");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Dropbox => "dropbox",
            ProviderKind::Google => "google",
            ProviderKind::OneDrive => "onedrive",
        }
    }

    /// Parse a provider kind from its identifier
    ///
    /// Matching is exact: identifiers are machine values, not user input.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("dropbox"), Some(ProviderKind::Dropbox));
    /// assert_eq!(ProviderKind::parse("none"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AuthError::InvalidProvider(s.to_string()))
    }
}

/// Bearer credential handed to drive implementations.
///
/// # Security
///
/// The `Debug` implementation redacts the secret so tokens never reach logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw token, for building an `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Token obtained from an [`AuthFlow`](crate::AuthFlow).
///
/// # Examples
///
/// ```
/// use core_auth::{AccessToken, TokenGrant};
/// use chrono::{Duration, Utc};
///
/// let grant = TokenGrant::new(AccessToken::new("sl.abc"), Some(Utc::now() + Duration::hours(4)));
/// assert!(!grant.is_expired_with_buffer(300));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The access token used for API requests
    pub access_token: AccessToken,
    /// When the access token expires (UTC); `None` for non-expiring tokens
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TokenGrant {
    pub fn new(
        access_token: AccessToken,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    /// Create a grant expiring `expires_in` seconds from now
    pub fn expiring_in(access_token: AccessToken, expires_in: i64) -> Self {
        Self::new(
            access_token,
            Some(chrono::Utc::now() + chrono::Duration::seconds(expires_in)),
        )
    }

    /// Check if the token is expired or expires within `buffer_seconds`
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                chrono::Utc::now() >= expires_at - chrono::Duration::seconds(buffer_seconds)
            }
            None => false,
        }
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &self.access_token)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
