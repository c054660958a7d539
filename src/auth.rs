//! Access-token acquisition for the chat backend.
//!
//! The orchestration service obtains a fresh credential from a
//! [`TokenProvider`] before each send. How a token comes to exist (OAuth
//! flow, session cookie exchange, test fixture) is the provider's business.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the Authorization header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Credential acquisition failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credential available: {0}")]
    Unavailable(String),
    #[error("Credential refresh failed: {0}")]
    Refresh(String),
}

/// Capability to obtain an access token, consumed once per send.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

/// Provider backed by a fixed token, e.g. from configuration.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        Ok(self.token.clone())
    }
}

/// Provider that reads the token from an environment variable on each call.
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(AuthError::Unavailable(format!("{} is not set", self.var))),
        }
    }
}
