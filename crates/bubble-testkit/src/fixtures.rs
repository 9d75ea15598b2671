//! Fixtures for setting up test scenarios.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bubble_auth::{AuthError, Authenticator};
use bubble_core::{ConversationEvent, Identity};
use chrono::{DateTime, TimeZone, Utc};

/// The local user in most scenarios.
pub const OWNER: &str = "ishmam";

/// The remote counterpart in most scenarios.
pub const BOT: &str = "bot";

/// Create an identity.
pub fn identity(username: &str) -> Identity {
    Identity::new(username)
}

/// A fixed base instant, so timestamps are reproducible.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A message stamped `offset_secs` after [`base_time`].
///
/// Negative offsets are fine and useful for out-of-order timestamps.
pub fn message_at(sender: &str, text: &str, offset_secs: i64) -> ConversationEvent {
    ConversationEvent::new(sender, text, base_time() + chrono::Duration::seconds(offset_secs))
}

/// A message stamped at [`base_time`].
pub fn message(sender: &str, text: &str) -> ConversationEvent {
    message_at(sender, text, 0)
}

/// An authenticator backed by a fixed user table.
///
/// Unknown users and wrong passwords fail with the same reason, like a
/// real server. Counts every attempt.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, String>,
    unreachable: bool,
    attempts: AtomicUsize,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `username` with `password`.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users.insert(username.to_string(), password.to_string());
        self
    }

    /// Fail every attempt as if the server were down.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Number of login attempts so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.unreachable {
            return Err(AuthError::Unreachable("connection refused".into()));
        }
        match self.users.get(username) {
            Some(expected) if expected == password => Ok(Identity::new(username)),
            _ => Err(AuthError::InvalidCredentials(
                "Invalid username or password".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_authenticator() {
        let auth = StaticAuthenticator::new().with_user(OWNER, "x");

        assert_eq!(auth.login(OWNER, "x").await, Ok(identity(OWNER)));
        assert!(matches!(
            auth.login(OWNER, "y").await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert!(matches!(
            auth.login("nobody", "x").await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert_eq!(auth.attempts(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_authenticator() {
        let auth = StaticAuthenticator::unreachable();
        assert!(matches!(
            auth.login(OWNER, "x").await,
            Err(AuthError::Unreachable(_))
        ));
    }

    #[test]
    fn test_message_offsets() {
        let early = message_at(BOT, "a", -5);
        let late = message_at(BOT, "b", 5);
        assert!(early.timestamp < late.timestamp);
        assert_eq!(message(BOT, "c").timestamp, base_time());
    }
}
