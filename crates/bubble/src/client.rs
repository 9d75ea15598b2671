//! ChatClient: login and persistence around the synchronizer.

use std::time::Duration;

use anyhow::Context;
use bubble_auth::{AuthError, Authenticator, HttpAuthenticator};
use bubble_core::Identity;
use bubble_store::{CredentialStore, SqliteCredentialStore};
use bubble_transport::{Connector, TcpConfig, TcpConnector};
use tokio::sync::watch;

use crate::config::{ClientConfig, SyncConfig};
use crate::error::Result;
use crate::session::{ConversationSnapshot, Session};
use crate::synchronizer::{SendOutcome, SyncEvent, Synchronizer};

/// The entry point for a presentation layer.
///
/// Owns an authenticator and a [`Synchronizer`], which in turn owns the
/// credential store and the channel.
pub struct ChatClient<A: Authenticator, C: Connector, S: CredentialStore> {
    authenticator: A,
    login_timeout: Duration,
    sync: Synchronizer<C, S>,
}

impl ChatClient<HttpAuthenticator, TcpConnector, SqliteCredentialStore> {
    /// Build a client with HTTP login, a TCP channel and SQLite persistence.
    pub fn connect_default(config: ClientConfig) -> anyhow::Result<Self> {
        let authenticator = HttpAuthenticator::new(&config.server_url, config.login_timeout)
            .context("failed to build login client")?;
        let store = SqliteCredentialStore::open(&config.store_path).with_context(|| {
            format!("failed to open credential store at {}", config.store_path.display())
        })?;
        let connector = TcpConnector::new(
            config.channel_addr.clone(),
            TcpConfig {
                connect_timeout: config.sync.connect_timeout,
                ..TcpConfig::default()
            },
        );

        Ok(Self::new(authenticator, connector, store, config.login_timeout, config.sync))
    }
}

impl<A: Authenticator, C: Connector, S: CredentialStore> ChatClient<A, C, S> {
    pub fn new(
        authenticator: A,
        connector: C,
        store: S,
        login_timeout: Duration,
        sync: SyncConfig,
    ) -> Self {
        Self {
            authenticator,
            login_timeout,
            sync: Synchronizer::new(connector, store, sync),
        }
    }

    pub fn synchronizer(&self) -> &Synchronizer<C, S> {
        &self.sync
    }

    pub fn session(&self) -> &Session {
        self.sync.session()
    }

    /// Bind the session to the identity persisted by a previous run.
    ///
    /// Returns the restored identity, or `None` when nobody was logged in.
    pub async fn restore(&mut self) -> Result<Option<Identity>> {
        let Some(identity) = self.sync.store().load().await? else {
            tracing::debug!("no persisted identity");
            return Ok(None);
        };

        tracing::info!(username = %identity.username, "restoring session");
        self.sync.on_identity_change(Some(identity.clone())).await?;
        Ok(Some(identity))
    }

    /// Authenticate, persist the identity, then bind the session to it.
    ///
    /// A failed login has no side effects. A login that succeeds but whose
    /// channel cannot be opened keeps the identity; see
    /// [`reconnect`](Self::reconnect).
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Identity> {
        let identity = tokio::time::timeout(
            self.login_timeout,
            self.authenticator.login(username, password),
        )
        .await
        .map_err(|_| AuthError::Unreachable("login timed out".to_string()))??;

        self.sync.store().save(&identity).await?;
        tracing::info!(username = %identity.username, "logged in");

        self.sync.on_identity_change(Some(identity.clone())).await?;
        Ok(identity)
    }

    /// Tear the session down and forget the persisted identity.
    pub async fn logout(&mut self) -> Result<()> {
        self.sync.on_identity_change(None).await
    }

    /// Retry opening the channel for the current identity.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.sync.reconnect().await
    }

    /// See [`Synchronizer::send_local`].
    pub async fn send_local(&mut self, text: &str) -> Result<SendOutcome> {
        self.sync.send_local(text).await
    }

    /// See [`Synchronizer::next_event`].
    pub async fn next_event(&mut self) -> Result<SyncEvent> {
        self.sync.next_event().await
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.sync.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.sync.snapshot()
    }
}
