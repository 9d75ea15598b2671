//! Error types for the transport module.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur opening or using a channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The counterpart refused the connection.
    #[error("connection refused: {0}")]
    Refused(String),

    /// Opening the channel did not complete in time.
    #[error("timed out after {0:?} waiting for the channel to open")]
    Timeout(Duration),

    /// The server answered the handshake with something unexpected.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The channel is closed or was dropped by the peer.
    #[error("channel closed")]
    Closed,

    /// A frame exceeded the configured size limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;
