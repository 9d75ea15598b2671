//! # Bubble
//!
//! The client core for Bubble chat: it authenticates a user, binds one event
//! channel to that identity, and keeps an ordered conversation view with
//! ephemeral typing placeholders.
//!
//! ## Overview
//!
//! - **Synchronizer**: owns the session and the conversation view, consumes
//!   channel events one at a time and publishes snapshots
//! - **ChatClient**: wires an authenticator and a credential store around
//!   the synchronizer
//!
//! ## Lifecycle
//!
//! ```text
//!   login ──► identity ──► Connecting ──► Open ──► logout ──► Closed
//!                              │                     ▲
//!                              └── open fails ───────┘
//! ```
//!
//! Logout is unconditional. The channel is torn down before it returns and
//! no event is applied afterwards.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bubble::{ChatClient, ClientConfig};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let mut client = ChatClient::connect_default(ClientConfig::from_env()?)?;
//!     let mut view = client.subscribe();
//!
//!     client.login("ishmam", "secret").await?;
//!     client.send_local("hello").await?;
//!
//!     while client.next_event().await.is_ok() {
//!         let snapshot = view.borrow_and_update().clone();
//!         for record in &snapshot.records {
//!             println!("{}: {:?}", record.display_name(), record.text());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `bubble::core` - Identities, events and the conversation merge
//! - `bubble::store` - Credential persistence
//! - `bubble::transport` - Channels and connectors
//! - `bubble::auth` - Login

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod synchronizer;

// Re-export component crates
pub use bubble_auth as auth;
pub use bubble_core as core;
pub use bubble_store as store;
pub use bubble_transport as transport;

pub use client::ChatClient;
pub use config::{ClientConfig, SyncConfig};
pub use error::{Result, SessionError};
pub use session::{ConversationSnapshot, Session};
pub use synchronizer::{SendOutcome, SyncEvent, Synchronizer};

// Commonly used core types
pub use bubble_core::{
    ChannelState, ConversationEvent, DisplayRecord, Identity, Origin, RemoteEvent, SendRejection,
};
