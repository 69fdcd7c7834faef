// Session credentials and the provider that fetches them

pub mod http_provider;

pub use http_provider::HttpTokenProvider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Successful body of `GET /token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub identity: String,
}

/// Error body of `GET /token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Http(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("malformed token response: {0}")]
    Decode(String),

    #[error("token request timed out")]
    Timeout,
}

/// A short-lived bearer token authorizing a voice session.
///
/// Replaced as a whole on refresh, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredential {
    token: String,
    identity: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn new(
        token: impl Into<String>,
        identity: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: std::time::Duration,
    ) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::with_expiry(token, identity, issued_at, expires_at)
    }

    /// Credential whose lifetime is dictated by the token itself
    pub fn with_expiry(
        token: impl Into<String>,
        identity: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            identity: identity.into(),
            issued_at,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Source of session credentials
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_credential(&self) -> Result<SessionCredential, TokenError>;
}
