//! In-memory implementation of the CredentialStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including the JSON round trip, but nothing outlives the process.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bubble_core::Identity;

use crate::error::{Result, StoreError};
use crate::traits::{CredentialStore, CREDENTIAL_KEY};

/// In-memory credential store.
///
/// Values are kept serialized, the way a browser's local storage would hold
/// them. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `identity`.
    pub fn with_identity(identity: &Identity) -> Result<Self> {
        let store = Self::new();
        store.put_raw(CREDENTIAL_KEY, serde_json::to_string(identity)?)?;
        Ok(store)
    }

    /// Write a raw value, bypassing serialization.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Read a raw value.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Identity>> {
        match self.get_raw(CREDENTIAL_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        self.put_raw(CREDENTIAL_KEY, serde_json::to_string(identity)?)
    }

    async fn clear(&self) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.remove(CREDENTIAL_KEY).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Identity::new("ishmam")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Identity::new("ishmam")));
        assert_eq!(
            store.get_raw(CREDENTIAL_KEY).unwrap().as_deref(),
            Some(r#"{"username":"ishmam"}"#)
        );
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryCredentialStore::with_identity(&Identity::new("ishmam")).unwrap();

        assert!(store.clear().await.unwrap());
        assert!(!store.clear().await.unwrap());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_corrupt_value() {
        let store = MemoryCredentialStore::new();
        store.put_raw(CREDENTIAL_KEY, "not json").unwrap();

        assert!(matches!(store.load().await, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_shared_store_through_arc() {
        let store = std::sync::Arc::new(MemoryCredentialStore::new());
        let handle = std::sync::Arc::clone(&store);

        handle.save(&Identity::new("bot")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Identity::new("bot")));
    }
}
