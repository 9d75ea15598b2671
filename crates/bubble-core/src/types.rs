//! Strong type definitions for Bubble.
//!
//! Wire-facing types derive serde with the field names the chat server uses,
//! so they can be decoded straight off a channel frame.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The authenticated user record held for the duration of a session.
///
/// Immutable once established. The server may return more fields in its
/// `user` object; anything beyond `username` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    /// Create an identity for the given username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Whether `sender` names this identity.
    pub fn is_sender(&self, sender: &str) -> bool {
        self.username == sender
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// A chat message, either sent locally or relayed by the server.
///
/// `timestamp` is an ISO-8601 instant. It is metadata for display only;
/// ordering is always by arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub sender: String,
    pub text: String,
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Writes `2024-01-01T12:00:00.000Z`, the form a browser's `toISOString` reads.
fn serialize_millis<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl ConversationEvent {
    /// Create an event with an explicit timestamp.
    pub fn new(sender: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Create an event stamped with the current time, to the millisecond.
    ///
    /// Millisecond precision is all the wire carries, so an echoed event
    /// compares equal to the one that was sent.
    pub fn now(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(sender, text, Utc::now().trunc_subsecs(3))
    }
}

/// A transient presence signal for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypingSignal {
    Start(String),
    Stop(String),
}

impl TypingSignal {
    /// The sender the signal is about.
    pub fn sender(&self) -> &str {
        match self {
            TypingSignal::Start(sender) | TypingSignal::Stop(sender) => sender,
        }
    }
}

/// Everything a channel can deliver to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// A resolved chat message.
    Message(ConversationEvent),
    /// `sender` started composing.
    TypingStart(String),
    /// `sender` stopped composing.
    TypingStop(String),
}

impl RemoteEvent {
    /// The sender this event originates from.
    pub fn sender(&self) -> &str {
        match self {
            RemoteEvent::Message(event) => &event.sender,
            RemoteEvent::TypingStart(sender) | RemoteEvent::TypingStop(sender) => sender,
        }
    }
}

impl From<TypingSignal> for RemoteEvent {
    fn from(signal: TypingSignal) -> Self {
        match signal {
            TypingSignal::Start(sender) => RemoteEvent::TypingStart(sender),
            TypingSignal::Stop(sender) => RemoteEvent::TypingStop(sender),
        }
    }
}

impl From<ConversationEvent> for RemoteEvent {
    fn from(event: ConversationEvent) -> Self {
        RemoteEvent::Message(event)
    }
}

/// Lifecycle of the event channel bound to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChannelState {
    /// No channel. Initial state, and the state after logout or failure.
    #[default]
    Closed,
    /// An identity is bound and the channel is being opened.
    Connecting,
    /// The counterpart confirmed the channel.
    Open,
}

impl ChannelState {
    /// Connecting or open.
    pub fn is_live(&self) -> bool {
        !matches!(self, ChannelState::Closed)
    }

    /// Check if the channel is open.
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_serialized_with_millis() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + chrono::Duration::nanoseconds(7_654_321);
        let json = serde_json::to_value(ConversationEvent::new("ishmam", "hi", at)).unwrap();
        assert_eq!(json["timestamp"], "2024-01-01T12:00:00.007Z");

        let now = serde_json::to_value(ConversationEvent::now("ishmam", "hi")).unwrap();
        assert_eq!(now["timestamp"].as_str().unwrap().len(), 24);
    }

    #[test]
    fn test_now_survives_the_wire() {
        let event = ConversationEvent::now("ishmam", "hi");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(serde_json::from_str::<ConversationEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_conversation_event_decodes_browser_timestamp() {
        let json = r#"{"text":"hi","timestamp":"2024-05-01T09:30:15.123Z","sender":"bot"}"#;
        let event: ConversationEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.sender, "bot");
        assert_eq!(event.text, "hi");
        assert_eq!(
            event.timestamp.timestamp_millis(),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap().timestamp_millis() + 123
        );
    }

    #[test]
    fn test_identity_ignores_extra_server_fields() {
        let json = r#"{"username":"ishmam","id":7,"avatar":null}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity, Identity::new("ishmam"));
        assert_eq!(identity.to_string(), "ishmam");
    }

    #[test]
    fn test_typing_signal_into_remote_event() {
        let start: RemoteEvent = TypingSignal::Start("bot".into()).into();
        let stop: RemoteEvent = TypingSignal::Stop("bot".into()).into();

        assert_eq!(start, RemoteEvent::TypingStart("bot".into()));
        assert_eq!(stop, RemoteEvent::TypingStop("bot".into()));
        assert_eq!(stop.sender(), "bot");
    }

    #[test]
    fn test_channel_state_liveness() {
        assert!(!ChannelState::Closed.is_live());
        assert!(ChannelState::Connecting.is_live());
        assert!(ChannelState::Open.is_live());
        assert!(!ChannelState::Connecting.is_open());
        assert_eq!(ChannelState::default(), ChannelState::Closed);
    }
}
