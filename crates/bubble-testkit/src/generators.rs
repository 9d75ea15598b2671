//! Proptest generators for property-based testing.

use proptest::prelude::*;

use bubble_core::{ConversationEvent, RemoteEvent};

use crate::fixtures::message_at;

/// Senders drawn from a small pool, so sequences collide often.
pub fn sender() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("bot".to_string()),
        Just("alice".to_string()),
        Just("bob".to_string()),
        Just("ishmam".to_string()),
    ]
}

/// Message text, possibly empty.
pub fn text() -> impl Strategy<Value = String> {
    "[a-z ]{0,16}"
}

/// A message with an arbitrary timestamp within a day of the base time.
pub fn conversation_event() -> impl Strategy<Value = ConversationEvent> {
    (sender(), text(), -86_400i64..86_400).prop_map(|(s, t, offset)| message_at(&s, &t, offset))
}

/// Any remote event.
pub fn remote_event() -> impl Strategy<Value = RemoteEvent> {
    prop_oneof![
        conversation_event().prop_map(RemoteEvent::Message),
        sender().prop_map(RemoteEvent::TypingStart),
        sender().prop_map(RemoteEvent::TypingStop),
    ]
}

/// A sequence of up to `max_len` remote events.
pub fn event_sequence(max_len: usize) -> impl Strategy<Value = Vec<RemoteEvent>> {
    prop::collection::vec(remote_event(), 0..=max_len)
}

/// A sequence of messages only, each with distinct text `"m{index}"`.
///
/// Timestamps are random, so arrival order and timestamp order disagree.
pub fn message_sequence(max_len: usize) -> impl Strategy<Value = Vec<ConversationEvent>> {
    prop::collection::vec((sender(), -86_400i64..86_400), 0..=max_len).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (s, offset))| message_at(&s, &format!("m{}", i), offset))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{Conversation, DisplayRecord, Identity};
    use chrono::Utc;
    use std::collections::HashMap;

    fn placeholders_by_sender(conversation: &Conversation) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for record in conversation.records() {
            if let DisplayRecord::Typing(p) = record {
                *counts.entry(p.sender.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    proptest! {
        #[test]
        fn test_message_resolves_placeholder(
            prefix in event_sequence(32),
            typist in sender(),
            body in text(),
            suffix_len in 0usize..4,
        ) {
            let mut conversation = Conversation::new();
            let own = Identity::new("ishmam");
            for event in prefix {
                conversation.apply(event, Some(&own), Utc::now());
            }

            conversation.apply(RemoteEvent::TypingStart(typist.clone()), Some(&own), Utc::now());
            // Other senders keep typing in between.
            for i in 0..suffix_len {
                conversation.apply(RemoteEvent::TypingStart(format!("other{}", i)), Some(&own), Utc::now());
            }
            conversation.apply(
                RemoteEvent::Message(message_at(&typist, &body, 0)),
                Some(&own),
                Utc::now(),
            );

            prop_assert!(!conversation.has_placeholder(&typist));
            let last = conversation.records().last().unwrap();
            prop_assert_eq!(last.sender(), typist.as_str());
            prop_assert_eq!(last.text(), Some(body.as_str()));
        }

        #[test]
        fn test_at_most_one_placeholder_per_sender(events in event_sequence(64)) {
            let mut conversation = Conversation::new();
            for event in events {
                conversation.apply(event, None, Utc::now());
                for (sender, count) in placeholders_by_sender(&conversation) {
                    prop_assert!(count <= 1, "{} has {} placeholders", sender, count);
                }
            }
        }

        #[test]
        fn test_arrival_order_beats_timestamps(messages in message_sequence(32)) {
            let mut conversation = Conversation::new();
            for event in messages.iter().cloned() {
                conversation.apply(RemoteEvent::Message(event), None, Utc::now());
            }

            let shown: Vec<&str> = conversation.records().iter().filter_map(|r| r.text()).collect();
            let arrived: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
            prop_assert_eq!(shown, arrived);
        }

        #[test]
        fn test_interleaved_typing_keeps_message_order(events in event_sequence(64)) {
            let mut conversation = Conversation::new();
            let mut arrived = Vec::new();
            for event in events {
                if let RemoteEvent::Message(m) = &event {
                    arrived.push(m.clone());
                }
                conversation.apply(event, None, Utc::now());
            }

            let shown: Vec<&ConversationEvent> = conversation
                .records()
                .iter()
                .filter_map(|r| match r {
                    DisplayRecord::Message { event, .. } => Some(event),
                    DisplayRecord::Typing(_) => None,
                })
                .collect();
            prop_assert_eq!(shown, arrived.iter().collect::<Vec<_>>());
        }
    }
}
