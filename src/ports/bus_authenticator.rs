//! BusAuthenticator port - Interface for logging into the event bus.
//!
//! The session manager calls this port at most once per cache miss; the
//! adapter only knows how to turn configured credentials into a [`Session`].

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::bus::Session;

/// Errors raised while obtaining a bus session.
///
/// None of these are fatal to the process: the next `get_session` call
/// performs a fresh login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Login request failed: {0}")]
    Transport(String),

    #[error("Bus rejected the credentials (status {status})")]
    Rejected { status: u16 },

    #[error("Unexpected login status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Malformed login response: {0}")]
    MalformedResponse(String),
}

impl AuthError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Port for acquiring an authentication token from the bus.
#[async_trait]
pub trait BusAuthenticator: Send + Sync {
    /// Performs one login attempt.
    async fn login(&self) -> Result<Session, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn BusAuthenticator) {}

    #[test]
    fn rejected_error_mentions_status() {
        let err = AuthError::Rejected { status: 401 };
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn malformed_helper_builds_variant() {
        let err = AuthError::malformed("empty return list");
        assert_eq!(err, AuthError::MalformedResponse("empty return list".to_string()));
    }
}
