//! Channel abstraction for the event transport.
//!
//! Implementations may use TCP, WebSockets, or an in-process hub. The session
//! layer only ever sees these two traits.

use std::fmt;

use async_trait::async_trait;
use bubble_core::{ChannelState, ConversationEvent, Identity, RemoteEvent};

use crate::error::Result;

/// Process-unique identifier for one opened channel, used in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Generate a random channel ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({:016x})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// An open, bidirectional event channel bound to one identity.
///
/// A channel only exists once the counterpart has confirmed it, so a fresh
/// channel reports [`ChannelState::Open`]. After [`close`](Channel::close)
/// it reports [`ChannelState::Closed`] forever.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Identifier for logging.
    fn id(&self) -> ChannelId;

    /// The identity this channel was opened for.
    fn identity(&self) -> &Identity;

    /// Current lifecycle state.
    fn state(&self) -> ChannelState;

    /// Transmit a chat message.
    ///
    /// Fails with `ConnectionError::Closed` once the channel is closed.
    async fn send(&self, event: &ConversationEvent) -> Result<()>;

    /// Receive the next inbound event.
    ///
    /// Events come out in the order the counterpart delivered them. Returns
    /// `None` once the channel is closed locally or dropped by the peer.
    async fn recv(&mut self) -> Option<RemoteEvent>;

    /// Tear the channel down.
    ///
    /// Synchronous and idempotent. Drops the inbound receiver and stops any
    /// background reader before returning, so no event is delivered after
    /// this call.
    fn close(&mut self);
}

/// Opens channels.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The channel type this connector produces.
    type Channel: Channel;

    /// Open a channel for `identity`.
    ///
    /// Completes once the counterpart confirms the channel, or fails with a
    /// `ConnectionError`. Never retries.
    async fn open(&self, identity: &Identity) -> Result<Self::Channel>;
}
