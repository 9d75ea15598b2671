//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SessionError};

/// Configuration for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound for opening a channel.
    pub connect_timeout: Duration,
    /// Drop typing placeholders older than this. `None` keeps them until a
    /// stop signal or a message arrives.
    pub typing_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            typing_timeout: None,
        }
    }
}

/// Configuration for [`ChatClient`](crate::ChatClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the login endpoint.
    pub server_url: String,
    /// `host:port` of the event channel.
    pub channel_addr: String,
    /// SQLite file holding the persisted identity.
    pub store_path: PathBuf,
    /// Upper bound for one login exchange.
    pub login_timeout: Duration,
    /// Synchronizer configuration.
    pub sync: SyncConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3001".to_string(),
            // The login server's port speaks HTTP, not JSON lines.
            channel_addr: "localhost:3002".to_string(),
            store_path: PathBuf::from("bubble.db"),
            login_timeout: Duration::from_secs(10),
            sync: SyncConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `BUBBLE_*` environment variables.
    ///
    /// Recognised: `BUBBLE_SERVER_URL`, `BUBBLE_CHANNEL_ADDR`,
    /// `BUBBLE_STORE_PATH`, `BUBBLE_TYPING_TIMEOUT_SECS` (0 disables).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BUBBLE_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(addr) = lookup("BUBBLE_CHANNEL_ADDR") {
            config.channel_addr = addr;
        }
        if let Some(path) = lookup("BUBBLE_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("BUBBLE_TYPING_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|_| SessionError::InvalidConfig {
                key: "BUBBLE_TYPING_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.sync.typing_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}
