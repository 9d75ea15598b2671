//! SQLite implementation of the CredentialStore trait.
//!
//! The primary backend for persisting the identity across restarts. Uses
//! rusqlite with bundled SQLite, wrapped in async via `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bubble_core::Identity;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{CredentialStore, CREDENTIAL_KEY};

/// SQLite-based credential store.
///
/// Thread-safe via an internal Mutex. Every operation runs on the blocking
/// pool so the async runtime is never stalled by disk I/O.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCredentialStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self) -> Result<Option<Identity>> {
        let value: Option<String> = self
            .with_conn(|conn| {
                Ok(conn
                    .query_row(
                        "SELECT value FROM kv WHERE key = ?1",
                        params![CREDENTIAL_KEY],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        let json = serde_json::to_string(identity)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![CREDENTIAL_KEY, json, now_millis()],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(username = %identity.username, "identity persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<bool> {
        let removed = self
            .with_conn(|conn| {
                Ok(conn.execute("DELETE FROM kv WHERE key = ?1", params![CREDENTIAL_KEY])?)
            })
            .await?;

        Ok(removed > 0)
    }
}
