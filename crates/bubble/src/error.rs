//! Error types for the client.

use bubble_auth::AuthError;
use bubble_store::StoreError;
use bubble_transport::ConnectionError;
use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The channel could not be opened or was lost.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Credential storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The operation needs an identity and none is bound.
    #[error("not logged in")]
    NotLoggedIn,

    /// The operation needs an open channel and there is none.
    #[error("no open channel")]
    NotConnected,

    /// A configuration value could not be parsed.
    #[error("invalid config value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
