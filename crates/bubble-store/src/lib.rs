//! # Bubble Store
//!
//! Credential persistence for the Bubble client. Provides a trait-based
//! interface over a single key holding the serialized [`Identity`], with
//! SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`CredentialStore`] - The async trait for identity persistence
//! - [`SqliteCredentialStore`] - SQLite-backed storage that survives restarts
//! - [`MemoryCredentialStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bubble_core::Identity;
//! use bubble_store::{CredentialStore, SqliteCredentialStore};
//!
//! async fn example() {
//!     let store = SqliteCredentialStore::open("bubble.db").unwrap();
//!
//!     store.save(&Identity::new("ishmam")).await.unwrap();
//!     let restored = store.load().await.unwrap();
//!     assert_eq!(restored, Some(Identity::new("ishmam")));
//!
//!     store.clear().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Single key**: the identity lives under [`CREDENTIAL_KEY`]
//! - **No logic**: stores read, write and delete; they never validate
//!
//! [`Identity`]: bubble_core::Identity

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;
pub use traits::{CredentialStore, CREDENTIAL_KEY};
