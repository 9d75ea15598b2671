//! # Bubble Auth
//!
//! Exchanges a username and password for an [`Identity`].
//!
//! A login is a single request/response exchange. It holds no state,
//! never retries, and either yields an identity or an [`AuthError`] whose
//! message is fit to show on a login form.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bubble_auth::{Authenticator, HttpAuthenticator};
//!
//! async fn example() {
//!     let auth = HttpAuthenticator::new("http://localhost:3001", Duration::from_secs(10)).unwrap();
//!     match auth.login("ishmam", "secret").await {
//!         Ok(identity) => println!("logged in as {}", identity),
//!         Err(e) => println!("{}", e),
//!     }
//! }
//! ```
//!
//! [`Identity`]: bubble_core::Identity

pub mod error;
pub mod http;

pub use error::{AuthError, Result};
pub use http::HttpAuthenticator;

use async_trait::async_trait;
use bubble_core::Identity;

/// One-shot credential exchange.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for an identity.
    ///
    /// Completes or fails exactly once per call.
    async fn login(&self, username: &str, password: &str) -> Result<Identity>;
}
