use bridge_traits::error::RemoteError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Provider {provider} requires sign-in")]
    AuthRequired { provider: String },

    #[error("Provider {provider} authentication failed: {reason}")]
    AuthenticationFailed { provider: String, reason: String },

    #[error("Token revocation failed for {provider}: {reason}")]
    RevocationFailed { provider: String, reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),
}

impl AuthError {
    /// Whether a later silent retry may succeed without user interaction.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuthError::Remote(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
