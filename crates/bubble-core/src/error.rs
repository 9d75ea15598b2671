//! Error types for Bubble Core.

use thiserror::Error;

use crate::types::ChannelState;

/// Why a local send intent was dropped.
///
/// These are validation outcomes, not failures: the caller is expected to
/// ignore them silently rather than surface them to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendRejection {
    #[error("message text is empty")]
    EmptyText,

    #[error("channel is not open (state: {0:?})")]
    NotOpen(ChannelState),
}
