//! Conversation: the arrival-ordered sequence of display records.
//!
//! This is the merge function from remote events to what the user sees.
//! Two rules hold after every operation:
//!
//! - **One placeholder per sender.** A sender that is typing has exactly one
//!   [`TypingPlaceholder`]; a stop signal or a message from that sender
//!   removes it before anything new is appended.
//! - **Append-only order.** Messages appear in the order they were applied.
//!   Timestamps are carried for display and never used to sort.

use chrono::{DateTime, Utc};

use crate::types::{ConversationEvent, Identity, RemoteEvent};
use crate::validation::capitalize_first;

/// Whether a message was written by the session's own identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Own,
    Other,
}

impl Origin {
    /// Classify `sender` relative to the current identity.
    ///
    /// With no identity bound every sender is `Other`.
    pub fn classify(sender: &str, own: Option<&Identity>) -> Self {
        match own {
            Some(identity) if identity.is_sender(sender) => Origin::Own,
            _ => Origin::Other,
        }
    }
}

/// A synthetic record showing that `sender` is composing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingPlaceholder {
    pub sender: String,
    /// When the start signal arrived locally.
    pub started_at: DateTime<Utc>,
}

/// One renderable unit of the conversation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayRecord {
    /// A resolved message.
    Message {
        event: ConversationEvent,
        origin: Origin,
    },
    /// A sender currently known to be typing.
    Typing(TypingPlaceholder),
}

impl DisplayRecord {
    /// The sender this record belongs to.
    pub fn sender(&self) -> &str {
        match self {
            DisplayRecord::Message { event, .. } => &event.sender,
            DisplayRecord::Typing(placeholder) => &placeholder.sender,
        }
    }

    /// Check if this is a typing placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, DisplayRecord::Typing(_))
    }

    /// Message text, if this record is a message.
    pub fn text(&self) -> Option<&str> {
        match self {
            DisplayRecord::Message { event, .. } => Some(&event.text),
            DisplayRecord::Typing(_) => None,
        }
    }

    /// Name to render next to the record.
    ///
    /// Own messages read "You"; everyone else gets their sender name with the
    /// first letter capitalized.
    pub fn display_name(&self) -> String {
        match self {
            DisplayRecord::Message {
                origin: Origin::Own,
                ..
            } => "You".to_string(),
            _ => capitalize_first(self.sender()),
        }
    }
}

/// The ordered conversation view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    records: Vec<DisplayRecord>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, in arrival order.
    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Apply one remote event.
    ///
    /// `own` is the identity messages are classified against, `now` stamps
    /// any placeholder created. Returns whether the view changed.
    pub fn apply(&mut self, event: RemoteEvent, own: Option<&Identity>, now: DateTime<Utc>) -> bool {
        match event {
            RemoteEvent::Message(message) => {
                self.append_message(message, own);
                true
            }
            RemoteEvent::TypingStart(sender) => self.start_typing(sender, now),
            RemoteEvent::TypingStop(sender) => self.stop_typing(&sender),
        }
    }

    /// Resolve any placeholder for the sender, then append the message.
    pub fn append_message(&mut self, event: ConversationEvent, own: Option<&Identity>) {
        self.remove_placeholder(&event.sender);
        let origin = Origin::classify(&event.sender, own);
        self.records.push(DisplayRecord::Message { event, origin });
    }

    /// Append a placeholder for `sender` unless one already exists.
    pub fn start_typing(&mut self, sender: String, now: DateTime<Utc>) -> bool {
        if self.has_placeholder(&sender) {
            return false;
        }
        self.records.push(DisplayRecord::Typing(TypingPlaceholder {
            sender,
            started_at: now,
        }));
        true
    }

    /// Remove the placeholder for `sender`, if any.
    pub fn stop_typing(&mut self, sender: &str) -> bool {
        self.remove_placeholder(sender)
    }

    /// Check if `sender` currently has a placeholder.
    pub fn has_placeholder(&self, sender: &str) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r, DisplayRecord::Typing(p) if p.sender == sender))
    }

    /// Number of placeholders across all senders.
    pub fn placeholder_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_placeholder()).count()
    }

    /// Start time of the oldest live placeholder.
    pub fn oldest_typing_start(&self) -> Option<DateTime<Utc>> {
        self.records
            .iter()
            .filter_map(|r| match r {
                DisplayRecord::Typing(p) => Some(p.started_at),
                DisplayRecord::Message { .. } => None,
            })
            .min()
    }

    /// Remove placeholders that started at or before `cutoff`.
    ///
    /// Returns how many were removed.
    pub fn expire_typing(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !matches!(r, DisplayRecord::Typing(p) if p.started_at <= cutoff));
        before - self.records.len()
    }

    fn remove_placeholder(&mut self, sender: &str) -> bool {
        // At most one exists, so the first match is the only one.
        let position = self
            .records
            .iter()
            .position(|r| matches!(r, DisplayRecord::Typing(p) if p.sender == sender));
        match position {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }
}
