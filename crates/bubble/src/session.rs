//! Session state and the snapshots published to observers.

use bubble_core::{ChannelState, DisplayRecord, Identity};

/// The identity bound to the client and the state of its channel.
///
/// Owned exclusively by the [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub channel_state: ChannelState,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// An immutable view of the conversation, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSnapshot {
    /// Increases by one with every published change.
    pub version: u64,
    pub channel_state: ChannelState,
    pub identity: Option<Identity>,
    /// Records in arrival order.
    pub records: Vec<DisplayRecord>,
}

impl ConversationSnapshot {
    /// Number of typing placeholders in the view.
    pub fn placeholder_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_placeholder()).count()
    }

    /// Message texts in display order, placeholders skipped.
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().filter_map(|r| r.text()).collect()
    }
}
