//! # Bubble Core
//!
//! Pure primitives for the Bubble chat client: identities, conversation
//! events, typing signals, and the ordered display merge.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the conversation view.
//!
//! ## Key Types
//!
//! - [`Identity`] - The authenticated user bound to a session
//! - [`ConversationEvent`] - A chat message as it travels on the wire
//! - [`RemoteEvent`] - Tagged union of everything a channel can deliver
//! - [`Conversation`] - The arrival-ordered sequence of [`DisplayRecord`]s
//!
//! ## Ordering
//!
//! Records are kept in the order their events reached the client. The
//! embedded timestamp is display metadata only and is never used to sort.

pub mod conversation;
pub mod error;
pub mod types;
pub mod validation;

pub use conversation::{Conversation, DisplayRecord, Origin, TypingPlaceholder};
pub use error::SendRejection;
pub use types::{ChannelState, ConversationEvent, Identity, RemoteEvent, TypingSignal};
pub use validation::{capitalize_first, prepare_outgoing_text};
