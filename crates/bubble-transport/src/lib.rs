//! # Bubble Transport
//!
//! The bidirectional event channel between a Bubble client and the chat
//! server.
//!
//! ## Overview
//!
//! A [`Connector`] opens a [`Channel`] bound to one [`Identity`]. The channel
//! is the only source and sink of wire events: outbound chat messages go
//! through [`Channel::send`], inbound messages and typing signals come out of
//! [`Channel::recv`] in the order the server delivered them.
//!
//! ## Lifecycle
//!
//! ```text
//!   open(identity)          server confirms          close() / drop
//! Closed -------> Connecting ---------------> Open ----------------> Closed
//!                     |                                                ^
//!                     +------------- ConnectionError ------------------+
//! ```
//!
//! `close()` is synchronous and final: the inbound receiver is dropped and
//! any background reader is aborted before it returns, so no event can be
//! delivered afterwards.
//!
//! ## Wire Format
//!
//! Newline-delimited JSON frames of the form `{"event": ..., "data": ...}`:
//!
//! ```text
//! Client                               Server
//!   |-------- join {username} ---------->|
//!   |<------- joined --------------------|
//!   |-------- send_message {..} -------->|
//!   |<------- typing {sender} -----------|
//!   |<------- stop_typing {sender} ------|
//!   |<------- receive_message {..} ------|
//! ```
//!
//! [`Identity`]: bubble_core::Identity

pub mod channel;
pub mod codec;
pub mod error;
pub mod memory;
pub mod messages;
pub mod tcp;

pub use channel::{Channel, ChannelId, Connector};
pub use codec::{FrameCodec, FrameReader, DEFAULT_MAX_FRAME_LEN};
pub use error::{ConnectionError, Result};
pub use memory::{MemoryChannel, MemoryConnector, MemoryHub};
pub use messages::WireFrame;
pub use tcp::{TcpChannel, TcpConfig, TcpConnector};
