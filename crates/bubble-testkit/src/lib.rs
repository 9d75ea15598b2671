//! # Bubble Testkit
//!
//! Testing utilities for Bubble.
//!
//! ## Overview
//!
//! - **Fixtures**: identities, events at fixed instants, and a
//!   [`StaticAuthenticator`] that logs in against a fixed user table
//! - **Generators**: Proptest strategies for remote event sequences
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use bubble_core::Conversation;
//! use bubble_testkit::generators::event_sequence;
//!
//! proptest! {
//!     #[test]
//!     fn one_placeholder_per_sender(events in event_sequence(64)) {
//!         let mut conversation = Conversation::new();
//!         for event in events {
//!             conversation.apply(event, None, chrono::Utc::now());
//!         }
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use bubble_testkit::fixtures::{message_at, BOT};
//!
//! let event = message_at(BOT, "hello", 0);
//! assert_eq!(event.sender, "bot");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{identity, message, message_at, StaticAuthenticator, BOT, OWNER};
pub use generators::{event_sequence, remote_event, sender};
