//! TCP transport: newline-delimited JSON frames over a socket.

use std::time::Duration;

use async_trait::async_trait;
use bubble_core::{ChannelState, ConversationEvent, Identity, RemoteEvent};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::channel::{Channel, ChannelId, Connector};
use crate::codec::{FrameCodec, FrameReader, DEFAULT_MAX_FRAME_LEN};
use crate::error::{ConnectionError, Result};
use crate::messages::WireFrame;

/// Configuration for TCP channels.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Upper bound for connect plus handshake.
    pub connect_timeout: Duration,
    /// Maximum size of a single frame.
    pub max_frame_len: usize,
    /// Inbound events buffered before the reader applies backpressure.
    pub event_buffer: usize,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            event_buffer: 256,
        }
    }
}

/// Opens [`TcpChannel`]s to a fixed server address.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    config: TcpConfig,
}

impl TcpConnector {
    /// Create a connector for `addr` (`host:port`).
    pub fn new(addr: impl Into<String>, config: TcpConfig) -> Self {
        Self {
            addr: addr.into(),
            config,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Connect and run the join handshake.
    async fn handshake(
        &self,
        identity: &Identity,
        codec: FrameCodec,
    ) -> Result<(FrameReader<OwnedReadHalf>, OwnedWriteHalf)> {
        let stream = TcpStream::connect(&self.addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                ConnectionError::Refused(format!("{}: {}", self.addr, e))
            } else {
                ConnectionError::Io(e)
            }
        })?;
        stream.set_nodelay(true)?;

        let (read, mut write) = stream.into_split();
        let join = WireFrame::Join {
            username: identity.username.clone(),
        };
        write.write_all(&codec.encode(&join)?).await?;

        let mut reader = FrameReader::new(read, codec);
        match reader.next_frame().await? {
            Some(WireFrame::Joined) => Ok((reader, write)),
            Some(other) => Err(ConnectionError::Handshake(format!(
                "expected joined, got {}",
                other.event_name()
            ))),
            None => Err(ConnectionError::Handshake(
                "server closed the connection during join".into(),
            )),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn open(&self, identity: &Identity) -> Result<TcpChannel> {
        let codec = FrameCodec::new(self.config.max_frame_len);
        let timeout = self.config.connect_timeout;

        let (reader, writer) = tokio::time::timeout(timeout, self.handshake(identity, codec))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout))??;

        let id = ChannelId::random();
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let reader_task = tokio::spawn(read_loop(id, reader, tx));

        tracing::info!(channel = %id, addr = %self.addr, username = %identity.username, "channel open");

        Ok(TcpChannel {
            id,
            identity: identity.clone(),
            codec,
            writer: Mutex::new(writer),
            events: Some(rx),
            reader_task: Some(reader_task),
        })
    }
}

/// Pump frames off the socket into the channel's event queue.
async fn read_loop(
    id: ChannelId,
    mut reader: FrameReader<OwnedReadHalf>,
    tx: mpsc::Sender<RemoteEvent>,
) {
    loop {
        match reader.next_frame().await {
            Ok(Some(frame)) => {
                let name = frame.event_name();
                match frame.into_remote_event() {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    None => tracing::debug!(channel = %id, event = name, "ignoring non-conversation frame"),
                }
            }
            Ok(None) => {
                tracing::info!(channel = %id, "server closed the channel");
                break;
            }
            Err(e) => {
                tracing::warn!(channel = %id, error = %e, "channel read failed");
                break;
            }
        }
    }
}

/// A channel over a TCP connection.
pub struct TcpChannel {
    id: ChannelId,
    identity: Identity,
    codec: FrameCodec,
    writer: Mutex<OwnedWriteHalf>,
    events: Option<mpsc::Receiver<RemoteEvent>>,
    reader_task: Option<JoinHandle<()>>,
}

#[async_trait]
impl Channel for TcpChannel {
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
        let bytes = self.codec.encode(&WireFrame::SendMessage(event.clone()))?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&bytes).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<RemoteEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    fn close(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if self.events.take().is_some() {
            tracing::info!(channel = %self.id, "channel closed");
        }
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.close();
    }
}
