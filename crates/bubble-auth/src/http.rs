//! HTTP login against the chat server's `/login` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use bubble_core::Identity;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::Authenticator;

/// Reason shown when the server rejects a login without saying why.
const DEFAULT_FAILURE_REASON: &str = "Login failed";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: Identity,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Logs in with `POST {server_url}/login`.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    client: reqwest::Client,
    login_url: String,
}

impl HttpAuthenticator {
    /// Create an authenticator for `server_url`.
    ///
    /// `timeout` bounds the whole exchange; hitting it reports
    /// [`AuthError::Unreachable`].
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            login_url: format!("{}/login", server_url.trim_end_matches('/')),
        })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        tracing::debug!(username, url = %self.login_url, "login attempt");

        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        if status.is_success() {
            let parsed: LoginResponse = serde_json::from_slice(&body)
                .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
            tracing::info!(username = %parsed.user.username, "login succeeded");
            return Ok(parsed.user);
        }

        let reason = match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(parsed) => parsed
                .error
                .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            Err(_) => {
                tracing::warn!(username, status = %status, "login failed with non-JSON body");
                return Err(AuthError::MalformedResponse(format!("HTTP {}", status)));
            }
        };

        // Any refusal with a JSON body shows the server's own words.
        tracing::warn!(username, status = %status, reason = %reason, "login rejected");
        Err(AuthError::InvalidCredentials(reason))
    }
}
