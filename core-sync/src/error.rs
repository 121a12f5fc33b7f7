use bridge_traits::error::{BridgeError, RemoteError};
use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("unknown cloud name: {0}")]
    UnknownProvider(String),

    #[error("cannot sync when disconnected")]
    NotConnected,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
