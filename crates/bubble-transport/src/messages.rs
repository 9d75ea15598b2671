//! Wire frame types.
//!
//! These are the events exchanged with the chat server. Each frame is a JSON
//! object with an `event` name and, for most events, a `data` payload.

use serde::{Deserialize, Serialize};

use bubble_core::{ConversationEvent, RemoteEvent};

/// Frames exchanged on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WireFrame {
    /// Client → server: bind this connection to a user.
    Join {
        username: String,
    },

    /// Server → client: the join was accepted and the channel is open.
    Joined,

    /// Client → server: a chat message from the local user.
    SendMessage(ConversationEvent),

    /// Server → client: a message relayed to every participant,
    /// including the echo of the client's own sends.
    ReceiveMessage(ConversationEvent),

    /// Server → client: `sender` started composing.
    Typing {
        sender: String,
    },

    /// Server → client: `sender` stopped composing.
    StopTyping {
        sender: String,
    },
}

impl WireFrame {
    /// The event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            WireFrame::Join { .. } => "join",
            WireFrame::Joined => "joined",
            WireFrame::SendMessage(_) => "send_message",
            WireFrame::ReceiveMessage(_) => "receive_message",
            WireFrame::Typing { .. } => "typing",
            WireFrame::StopTyping { .. } => "stop_typing",
        }
    }

    /// Convert an inbound frame into the event the synchronizer consumes.
    ///
    /// Returns `None` for frames that carry no conversation content
    /// (handshake frames, or outbound-only frames echoed by a confused peer).
    pub fn into_remote_event(self) -> Option<RemoteEvent> {
        match self {
            WireFrame::ReceiveMessage(event) => Some(RemoteEvent::Message(event)),
            WireFrame::Typing { sender } => Some(RemoteEvent::TypingStart(sender)),
            WireFrame::StopTyping { sender } => Some(RemoteEvent::TypingStop(sender)),
            WireFrame::Join { .. } | WireFrame::Joined | WireFrame::SendMessage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_send_message_shape() {
        let event = ConversationEvent::new(
            "ishmam",
            "hi",
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(WireFrame::SendMessage(event)).unwrap();

        assert_eq!(json["event"], "send_message");
        assert_eq!(json["data"]["sender"], "ishmam");
        assert_eq!(json["data"]["text"], "hi");
        assert_eq!(json["data"]["timestamp"], "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn test_inbound_frames_decode() {
        let typing: WireFrame =
            serde_json::from_str(r#"{"event":"typing","data":{"sender":"bot"}}"#).unwrap();
        let stop: WireFrame =
            serde_json::from_str(r#"{"event":"stop_typing","data":{"sender":"bot"}}"#).unwrap();
        let message: WireFrame = serde_json::from_str(
            r#"{"event":"receive_message","data":{"text":"hello","timestamp":"2024-01-01T12:00:00.000Z","sender":"bot"}}"#,
        )
        .unwrap();

        assert_eq!(typing.into_remote_event(), Some(RemoteEvent::TypingStart("bot".into())));
        assert_eq!(stop.into_remote_event(), Some(RemoteEvent::TypingStop("bot".into())));
        match message.into_remote_event() {
            Some(RemoteEvent::Message(event)) => {
                assert_eq!(event.sender, "bot");
                assert_eq!(event.text, "hello");
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_joined_without_data() {
        let frame: WireFrame = serde_json::from_str(r#"{"event":"joined"}"#).unwrap();
        assert_eq!(frame, WireFrame::Joined);
        assert_eq!(frame.event_name(), "joined");
        assert_eq!(frame.into_remote_event(), None);
    }

    #[test]
    fn test_unknown_event_rejected() {
        let result: Result<WireFrame, _> =
            serde_json::from_str(r#"{"event":"presence","data":{"online":3}}"#);
        assert!(result.is_err());
    }
}
