//! CredentialStore trait: the abstract interface for identity persistence.
//!
//! This trait keeps the session layer storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use bubble_core::Identity;

use crate::error::Result;

/// The key the serialized identity is stored under.
pub const CREDENTIAL_KEY: &str = "bubble_user";

/// Async interface for persisting the authenticated identity.
///
/// Written on successful login, read at startup, deleted on logout. Callers
/// never mutate it concurrently: all three happen on the session's single
/// control path.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the persisted identity, if any.
    async fn load(&self) -> Result<Option<Identity>>;

    /// Persist `identity`, replacing whatever was stored.
    async fn save(&self, identity: &Identity) -> Result<()>;

    /// Delete the persisted identity.
    ///
    /// Returns whether one was present. Clearing an empty store is not an
    /// error.
    async fn clear(&self) -> Result<bool>;
}

/// Shared stores: lets a caller keep a handle to the store it hands to a
/// session.
#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    async fn load(&self) -> Result<Option<Identity>> {
        (**self).load().await
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        (**self).save(identity).await
    }

    async fn clear(&self) -> Result<bool> {
        (**self).clear().await
    }
}
