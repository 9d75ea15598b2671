//! The stream synchronizer: session lifecycle plus the ordered view.
//!
//! The synchronizer is a `&mut self` state machine. Channel events, local
//! sends and identity changes all run on the caller's single control path,
//! so the conversation is never touched concurrently and needs no lock.

use std::time::Duration;

use bubble_core::{
    prepare_outgoing_text, ChannelState, Conversation, ConversationEvent, DisplayRecord, Identity,
    RemoteEvent, SendRejection,
};
use bubble_store::CredentialStore;
use bubble_transport::{Channel, ConnectionError, Connector};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::config::SyncConfig;
use crate::error::{Result, SessionError};
use crate::session::{ConversationSnapshot, Session};

/// Result of a local send intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Transmitted. The view changes only when the server echoes it back.
    Sent(ConversationEvent),
    /// Dropped before reaching the channel.
    Rejected(SendRejection),
}

/// What [`Synchronizer::next_event`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A channel event was applied to the view.
    Remote(RemoteEvent),
    /// This many stale typing placeholders were dropped.
    TypingExpired(usize),
}

/// Owns the session, the channel and the conversation view.
pub struct Synchronizer<C: Connector, S: CredentialStore> {
    connector: C,
    store: S,
    config: SyncConfig,
    session: Session,
    /// Present exactly while the session is `Open`.
    channel: Option<C::Channel>,
    conversation: Conversation,
    snapshots: watch::Sender<ConversationSnapshot>,
    version: u64,
}

impl<C: Connector, S: CredentialStore> Synchronizer<C, S> {
    /// Create a synchronizer with no identity bound.
    pub fn new(connector: C, store: S, config: SyncConfig) -> Self {
        let (snapshots, _) = watch::channel(ConversationSnapshot::default());
        Self {
            connector,
            store,
            config,
            session: Session::default(),
            channel: None,
            conversation: Conversation::new(),
            snapshots,
            version: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity.as_ref()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.session.channel_state
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[DisplayRecord] {
        self.conversation.records()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Subscribe to snapshots. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshots.borrow().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind the session to `identity`, or tear it down with `None`.
    ///
    /// Binding the identity that is already bound with a live channel is a
    /// no-op. Any other identity closes the existing channel, empties the
    /// view and opens a fresh channel, so a session never holds two.
    ///
    /// `None` closes the channel, clears the session and the view, and
    /// deletes the persisted identity. The in-memory teardown happens even
    /// when the store fails.
    pub async fn on_identity_change(&mut self, identity: Option<Identity>) -> Result<()> {
        match identity {
            Some(identity) => {
                if self.session.identity.as_ref() == Some(&identity) && self.channel.is_some() {
                    tracing::debug!(username = %identity.username, "identity unchanged, channel live");
                    return Ok(());
                }

                self.teardown_channel();
                self.conversation.clear();
                self.session.identity = Some(identity.clone());
                self.connect(&identity).await
            }
            None => {
                let previous = self.session.identity.take();
                self.teardown_channel();
                self.conversation.clear();
                self.publish();

                if let Some(previous) = previous {
                    tracing::info!(username = %previous.username, "logged out");
                }
                self.store.clear().await?;
                Ok(())
            }
        }
    }

    /// Open a new channel for the bound identity after a failure.
    ///
    /// A no-op while a channel is open. Messages already in the view are
    /// kept; typing placeholders are dropped since their stop signals may
    /// have been lost.
    pub async fn reconnect(&mut self) -> Result<()> {
        let identity = self.session.identity.clone().ok_or(SessionError::NotLoggedIn)?;
        if self.channel.is_some() {
            return Ok(());
        }

        self.conversation.expire_typing(DateTime::<Utc>::MAX_UTC);
        self.connect(&identity).await
    }

    async fn connect(&mut self, identity: &Identity) -> Result<()> {
        self.session.channel_state = ChannelState::Connecting;
        self.publish();
        tracing::debug!(username = %identity.username, state = ?self.session.channel_state, "opening channel");

        let timeout = self.config.connect_timeout;
        let opened = match tokio::time::timeout(timeout, self.connector.open(identity)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(timeout)),
        };

        match opened {
            Ok(channel) => {
                tracing::info!(channel = %channel.id(), username = %identity.username, "session open");
                self.channel = Some(channel);
                self.session.channel_state = ChannelState::Open;
                self.publish();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(username = %identity.username, error = %e, "channel open failed");
                self.session.channel_state = ChannelState::Closed;
                self.publish();
                Err(e.into())
            }
        }
    }

    /// Close and drop the channel. Always lands in `Closed`.
    fn teardown_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            tracing::debug!(channel = %channel.id(), "channel torn down");
        }
        self.session.channel_state = ChannelState::Closed;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply one remote event to the view.
    ///
    /// Ignored unless the session is open. Returns whether the view changed.
    pub fn handle_remote_event(&mut self, event: RemoteEvent) -> bool {
        if !self.session.channel_state.is_open() {
            tracing::debug!(sender = event.sender(), "dropping event outside an open session");
            return false;
        }

        let changed = self
            .conversation
            .apply(event, self.session.identity.as_ref(), Utc::now());
        if changed {
            self.publish();
        }
        changed
    }

    /// Wait for the next channel event and apply it.
    ///
    /// With a typing timeout configured this also wakes when the oldest
    /// placeholder goes stale. Fails with [`SessionError::NotConnected`]
    /// when no channel is open, and with `ConnectionError::Closed` when the
    /// peer drops the channel, which leaves the session `Closed`.
    pub async fn next_event(&mut self) -> Result<SyncEvent> {
        loop {
            let deadline = self.typing_deadline();
            let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

            let received = match deadline {
                Some(deadline) => tokio::select! {
                    event = channel.recv() => Some(event),
                    _ = tokio::time::sleep_until(deadline) => None,
                },
                None => Some(channel.recv().await),
            };

            match received {
                Some(Some(event)) => {
                    self.handle_remote_event(event.clone());
                    return Ok(SyncEvent::Remote(event));
                }
                Some(None) => {
                    tracing::warn!(state = ?self.session.channel_state, "channel dropped by peer");
                    self.teardown_channel();
                    self.publish();
                    return Err(ConnectionError::Closed.into());
                }
                None => {
                    let removed = self.expire_typing(Utc::now());
                    if removed > 0 {
                        return Ok(SyncEvent::TypingExpired(removed));
                    }
                }
            }
        }
    }

    /// Drop placeholders older than the configured typing timeout.
    ///
    /// Returns how many were removed; always 0 without a timeout.
    pub fn expire_typing(&mut self, now: DateTime<Utc>) -> usize {
        let Some(timeout) = self.typing_timeout() else {
            return 0;
        };

        // A cutoff before the earliest representable instant expires nothing.
        let Some(cutoff) = now.checked_sub_signed(timeout) else {
            return 0;
        };

        let removed = self.conversation.expire_typing(cutoff);
        if removed > 0 {
            tracing::debug!(removed, "expired typing placeholders");
            self.publish();
        }
        removed
    }

    fn typing_timeout(&self) -> Option<chrono::Duration> {
        self.config
            .typing_timeout
            .and_then(|t| chrono::Duration::from_std(t).ok())
    }

    /// When the oldest placeholder goes stale. `None` when nothing can
    /// expire, including timeouts too far out to represent.
    fn typing_deadline(&self) -> Option<tokio::time::Instant> {
        let timeout = self.typing_timeout()?;
        let oldest = self.conversation.oldest_typing_start()?;
        let expires_at = oldest.checked_add_signed(timeout)?;
        let remaining = (expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        tokio::time::Instant::now().checked_add(remaining)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local sends
    // ─────────────────────────────────────────────────────────────────────────

    /// Transmit a message from the bound identity.
    ///
    /// Blank text or a channel that is not open rejects the intent without
    /// touching the channel. A sent message is not appended locally: it
    /// shows up when the server relays it back.
    pub async fn send_local(&mut self, text: &str) -> Result<SendOutcome> {
        let state = self.session.channel_state;
        let text = match prepare_outgoing_text(text, state) {
            Ok(text) => text,
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "send rejected");
                return Ok(SendOutcome::Rejected(rejection));
            }
        };
        let (Some(identity), Some(channel)) = (&self.session.identity, &self.channel) else {
            return Ok(SendOutcome::Rejected(SendRejection::NotOpen(state)));
        };

        let event = ConversationEvent::now(identity.username.clone(), text);
        let sent = channel.send(&event).await;
        match sent {
            Ok(()) => {
                tracing::debug!(sender = %event.sender, len = event.text.len(), "message sent");
                Ok(SendOutcome::Sent(event))
            }
            Err(e @ (ConnectionError::FrameTooLarge { .. } | ConnectionError::Codec(_))) => {
                tracing::warn!(error = %e, "message not sent");
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(error = %e, "send failed, closing channel");
                self.teardown_channel();
                self.publish();
                Err(e.into())
            }
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        self.snapshots.send_replace(ConversationSnapshot {
            version: self.version,
            channel_state: self.session.channel_state,
            identity: self.session.identity.clone(),
            records: self.conversation.records().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bubble_core::Origin;
    use bubble_store::MemoryCredentialStore;
    use bubble_transport::{MemoryConnector, MemoryHub};

    type TestSync = Synchronizer<MemoryConnector, Arc<MemoryCredentialStore>>;

    fn setup(config: SyncConfig) -> (Arc<MemoryHub>, Arc<MemoryCredentialStore>, TestSync) {
        let hub = MemoryHub::new();
        let store = Arc::new(MemoryCredentialStore::new());
        let sync = Synchronizer::new(hub.connector(), Arc::clone(&store), config);
        (hub, store, sync)
    }

    fn ishmam() -> Identity {
        Identity::new("ishmam")
    }

    #[tokio::test]
    async fn test_identity_opens_channel() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        let mut view = sync.subscribe();

        sync.on_identity_change(Some(ishmam())).await.unwrap();

        assert_eq!(sync.channel_state(), ChannelState::Open);
        assert_eq!(hub.connected(), vec![ishmam()]);
        assert!(view.has_changed().unwrap());
        let snapshot = view.borrow_and_update().clone();
        assert_eq!(snapshot.channel_state, ChannelState::Open);
        assert_eq!(snapshot.identity, Some(ishmam()));
    }

    #[tokio::test]
    async fn test_same_identity_is_idempotent() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());

        sync.on_identity_change(Some(ishmam())).await.unwrap();
        hub.emit(RemoteEvent::Message(ConversationEvent::now("bot", "hello")));
        sync.next_event().await.unwrap();

        sync.on_identity_change(Some(ishmam())).await.unwrap();

        assert_eq!(hub.open_count(), 1);
        assert_eq!(sync.records().len(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_lands_closed() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        hub.refuse_connections(Some("server down"));

        let result = sync.on_identity_change(Some(ishmam())).await;

        assert!(matches!(
            result,
            Err(SessionError::Connection(ConnectionError::Refused(_)))
        ));
        assert_eq!(sync.channel_state(), ChannelState::Closed);
        assert_eq!(sync.identity(), Some(&ishmam()));

        hub.refuse_connections(None);
        sync.reconnect().await.unwrap();
        assert_eq!(sync.channel_state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn test_reconnect_requires_identity() {
        let (_hub, _store, mut sync) = setup(SyncConfig::default());
        assert!(matches!(sync.reconnect().await, Err(SessionError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_blank_sends_never_reach_channel() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        sync.on_identity_change(Some(ishmam())).await.unwrap();
        let before = sync.snapshot();

        for text in ["", "   ", "\n\t"] {
            let outcome = sync.send_local(text).await.unwrap();
            assert_eq!(outcome, SendOutcome::Rejected(SendRejection::EmptyText));
        }

        assert!(hub.sent().is_empty());
        assert_eq!(sync.snapshot(), before);
    }

    #[tokio::test]
    async fn test_send_while_closed_is_dropped() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        let before = sync.snapshot();

        let outcome = sync.send_local("hi").await.unwrap();

        assert_eq!(
            outcome,
            SendOutcome::Rejected(SendRejection::NotOpen(ChannelState::Closed))
        );
        assert!(hub.sent().is_empty());
        assert_eq!(sync.snapshot(), before);
    }

    #[tokio::test]
    async fn test_send_waits_for_echo() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        hub.set_echo(true);
        sync.on_identity_change(Some(ishmam())).await.unwrap();

        let outcome = sync.send_local("  hi  ").await.unwrap();
        let SendOutcome::Sent(event) = outcome else {
            panic!("expected a send");
        };
        assert_eq!(event.text, "hi");
        assert_eq!(event.sender, "ishmam");
        assert!(sync.records().is_empty());

        sync.next_event().await.unwrap();
        match &sync.records()[0] {
            DisplayRecord::Message { event: shown, origin } => {
                assert_eq!(shown, &event);
                assert_eq!(*origin, Origin::Own);
            }
            other => panic!("expected message, got {:?}", other),
        }
        assert_eq!(sync.records()[0].display_name(), "You");
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (hub, store, mut sync) = setup(SyncConfig::default());
        store.save(&ishmam()).await.unwrap();
        sync.on_identity_change(Some(ishmam())).await.unwrap();
        hub.emit(RemoteEvent::TypingStart("bot".into()));
        sync.next_event().await.unwrap();

        assert!(sync.session().is_logged_in());
        sync.on_identity_change(None).await.unwrap();

        assert!(!sync.session().is_logged_in());
        assert!(sync.records().is_empty());
        assert_eq!(sync.channel_state(), ChannelState::Closed);
        assert_eq!(sync.identity(), None);
        assert_eq!(store.load().await.unwrap(), None);
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.emit(RemoteEvent::TypingStart("bot".into())), 0);
        assert!(matches!(sync.next_event().await, Err(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_events_ignored_when_not_open() {
        let (_hub, _store, mut sync) = setup(SyncConfig::default());

        assert!(!sync.handle_remote_event(RemoteEvent::TypingStart("bot".into())));
        assert!(sync.records().is_empty());
    }

    #[tokio::test]
    async fn test_peer_disconnect() {
        let (hub, _store, mut sync) = setup(SyncConfig::default());
        sync.on_identity_change(Some(ishmam())).await.unwrap();

        hub.disconnect_all();
        let result = sync.next_event().await;

        assert!(matches!(
            result,
            Err(SessionError::Connection(ConnectionError::Closed))
        ));
        assert_eq!(sync.channel_state(), ChannelState::Closed);
        assert_eq!(sync.snapshot().channel_state, ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_typing_expiry_disabled_by_default() {
        let (_hub, _store, mut sync) = setup(SyncConfig::default());
        sync.on_identity_change(Some(ishmam())).await.unwrap();
        sync.handle_remote_event(RemoteEvent::TypingStart("bot".into()));

        assert_eq!(sync.expire_typing(Utc::now() + chrono::Duration::hours(1)), 0);
        assert_eq!(sync.snapshot().placeholder_count(), 1);
    }

    #[tokio::test]
    async fn test_huge_typing_timeout_never_expires() {
        let config = SyncConfig {
            typing_timeout: Some(Duration::from_secs(1_000_000_000_000_000)),
            ..SyncConfig::default()
        };
        let (hub, _store, mut sync) = setup(config);
        sync.on_identity_change(Some(ishmam())).await.unwrap();

        hub.emit(RemoteEvent::TypingStart("bot".into()));
        sync.next_event().await.unwrap();
        hub.emit(RemoteEvent::TypingStop("bot".into()));
        assert_eq!(
            sync.next_event().await.unwrap(),
            SyncEvent::Remote(RemoteEvent::TypingStop("bot".into()))
        );

        sync.handle_remote_event(RemoteEvent::TypingStart("bot".into()));
        assert_eq!(sync.expire_typing(Utc::now()), 0);
        assert_eq!(sync.snapshot().placeholder_count(), 1);
    }

    #[tokio::test]
    async fn test_next_event_expires_stale_typing() {
        let config = SyncConfig {
            typing_timeout: Some(Duration::from_millis(30)),
            ..SyncConfig::default()
        };
        let (hub, _store, mut sync) = setup(config);
        sync.on_identity_change(Some(ishmam())).await.unwrap();

        hub.emit(RemoteEvent::TypingStart("bot".into()));
        assert_eq!(
            sync.next_event().await.unwrap(),
            SyncEvent::Remote(RemoteEvent::TypingStart("bot".into()))
        );

        let step = tokio::time::timeout(Duration::from_secs(2), sync.next_event())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(step, SyncEvent::TypingExpired(1));
        assert_eq!(sync.snapshot().placeholder_count(), 0);
    }
}
