//! An in-process transport for testing.
//!
//! [`MemoryHub`] plays the chat server: it keeps one inbound queue per open
//! channel, records everything clients send, and can relay sent messages
//! back to every participant the way the real server does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bubble_core::{ChannelState, ConversationEvent, Identity, RemoteEvent};
use tokio::sync::mpsc;

use crate::channel::{Channel, ChannelId, Connector};
use crate::error::{ConnectionError, Result};

struct Client {
    identity: Identity,
    tx: mpsc::UnboundedSender<RemoteEvent>,
}

#[derive(Default)]
struct HubInner {
    clients: HashMap<ChannelId, Client>,
    sent: Vec<ConversationEvent>,
    /// When set, `open` fails with this reason.
    refuse: Option<String>,
    echo: bool,
    opened: usize,
}

/// Shared state standing in for the chat server.
#[derive(Default)]
pub struct MemoryHub {
    inner: Mutex<HubInner>,
}

impl MemoryHub {
    /// Create a new hub.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a connector that opens channels on this hub.
    pub fn connector(self: &Arc<Self>) -> MemoryConnector {
        MemoryConnector {
            hub: Arc::clone(self),
        }
    }

    // A panicking test thread must not wedge every other user of the hub.
    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Relay every sent message back to all open channels.
    pub fn set_echo(&self, echo: bool) {
        self.lock().echo = echo;
    }

    /// Make subsequent `open` calls fail (`Some(reason)`) or succeed (`None`).
    pub fn refuse_connections(&self, reason: Option<&str>) {
        self.lock().refuse = reason.map(String::from);
    }

    /// Deliver `event` to every open channel. Returns how many received it.
    pub fn emit(&self, event: RemoteEvent) -> usize {
        let inner = self.lock();
        broadcast(&inner, &event)
    }

    /// Deliver `event` only to channels opened for `identity`.
    pub fn emit_to(&self, identity: &Identity, event: RemoteEvent) -> usize {
        let inner = self.lock();
        inner
            .clients
            .values()
            .filter(|c| &c.identity == identity)
            .filter(|c| c.tx.send(event.clone()).is_ok())
            .count()
    }

    /// Every message clients have sent, in send order.
    pub fn sent(&self) -> Vec<ConversationEvent> {
        self.lock().sent.clone()
    }

    /// Identities with a currently open channel.
    pub fn connected(&self) -> Vec<Identity> {
        self.lock().clients.values().map(|c| c.identity.clone()).collect()
    }

    /// Number of currently open channels.
    pub fn connection_count(&self) -> usize {
        self.lock().clients.len()
    }

    /// Number of channels ever opened on this hub.
    pub fn open_count(&self) -> usize {
        self.lock().opened
    }

    /// Drop every connection from the server side.
    ///
    /// Clients observe this as `recv` returning `None`.
    pub fn disconnect_all(&self) {
        self.lock().clients.clear();
    }

    fn register(&self, identity: &Identity) -> Result<(ChannelId, mpsc::UnboundedReceiver<RemoteEvent>)> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.refuse {
            return Err(ConnectionError::Refused(reason.clone()));
        }

        let id = ChannelId::random();
        let (tx, rx) = mpsc::unbounded_channel();
        inner.clients.insert(
            id,
            Client {
                identity: identity.clone(),
                tx,
            },
        );
        inner.opened += 1;
        Ok((id, rx))
    }

    fn unregister(&self, id: ChannelId) {
        self.lock().clients.remove(&id);
    }

    fn record_send(&self, from: ChannelId, event: &ConversationEvent) -> Result<()> {
        let mut inner = self.lock();
        if !inner.clients.contains_key(&from) {
            return Err(ConnectionError::Closed);
        }
        inner.sent.push(event.clone());
        if inner.echo {
            broadcast(&inner, &RemoteEvent::Message(event.clone()));
        }
        Ok(())
    }
}

fn broadcast(inner: &HubInner, event: &RemoteEvent) -> usize {
    // Receivers that were closed locally just miss the event.
    inner
        .clients
        .values()
        .filter(|c| c.tx.send(event.clone()).is_ok())
        .count()
}

/// Opens [`MemoryChannel`]s on a [`MemoryHub`].
#[derive(Clone)]
pub struct MemoryConnector {
    hub: Arc<MemoryHub>,
}

impl MemoryConnector {
    pub fn hub(&self) -> &Arc<MemoryHub> {
        &self.hub
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Channel = MemoryChannel;

    async fn open(&self, identity: &Identity) -> Result<MemoryChannel> {
        let (id, rx) = self.hub.register(identity)?;
        tracing::debug!(channel = %id, username = %identity.username, "memory channel open");

        Ok(MemoryChannel {
            id,
            identity: identity.clone(),
            hub: Arc::clone(&self.hub),
            events: Some(rx),
        })
    }
}

/// A channel connected to a [`MemoryHub`].
pub struct MemoryChannel {
    id: ChannelId,
    identity: Identity,
    hub: Arc<MemoryHub>,
    events: Option<mpsc::UnboundedReceiver<RemoteEvent>>,
}

#[async_trait]
impl Channel for MemoryChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn state(&self) -> ChannelState {
        if self.events.is_some() {
            ChannelState::Open
        } else {
            ChannelState::Closed
        }
    }

    async fn send(&self, event: &ConversationEvent) -> Result<()> {
        if self.events.is_none() {
            return Err(ConnectionError::Closed);
        }
        self.hub.record_send(self.id, event)
    }

    async fn recv(&mut self) -> Option<RemoteEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    fn close(&mut self) {
        if self.events.take().is_some() {
            self.hub.unregister(self.id);
            tracing::debug!(channel = %self.id, "memory channel closed");
        }
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        self.close();
    }
}
