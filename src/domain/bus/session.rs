//! Session - an authenticated token for the event bus.

use secrecy::{ExposeSecret, Secret};

use crate::domain::foundation::Timestamp;

/// Token issued by the bus login endpoint.
///
/// The token is kept behind [`Secret`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug)]
pub struct Session {
    token: Secret<String>,
    issued_at: Timestamp,
    expires_at: Timestamp,
    user: Option<String>,
}

impl Session {
    /// Creates a session from a token and its expiry.
    pub fn new(token: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            token: Secret::new(token.into()),
            issued_at: Timestamp::now(),
            expires_at,
            user: None,
        }
    }

    /// Overrides the issue time with the one the bus reported.
    pub fn with_issued_at(mut self, issued_at: Timestamp) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Records which user the bus issued the token to.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Exposes the token (for the `X-Auth-Token` header).
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// True once the bus-reported expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_past()
    }
}
