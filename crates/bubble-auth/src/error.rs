//! Error types for login.

use thiserror::Error;

/// Why a login attempt failed.
///
/// All variants are recoverable by trying again; the message is meant for
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server refused the login. Carries its `error` string as is.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server could not be reached or failed to answer.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with something other than the expected JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

/// Result type for login.
pub type Result<T> = std::result::Result<T, AuthError>;
