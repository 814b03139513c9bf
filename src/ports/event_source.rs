//! EventSource port - Interface for opening the bus event stream.
//!
//! An adapter turns a session token into a raw byte stream. Framing and JSON
//! decoding happen in the stream reader, so adapters stay transport-only.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

/// Raw body chunks of the event stream, split at arbitrary boundaries.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, StreamError>> + Send>>;

/// Connection-level failures of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Failed to connect to event stream: {0}")]
    Connect(String),

    #[error("Event stream rejected the session token (status {status})")]
    Unauthorized { status: u16 },

    #[error("Event stream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Event stream read failed: {0}")]
    Read(String),

    #[error("Event stream closed by server")]
    Closed,
}

impl StreamError {
    /// True when a fresh login is needed before reconnecting.
    pub fn is_auth_related(&self) -> bool {
        matches!(self, StreamError::Unauthorized { .. })
    }
}

/// Port for opening the long-lived event stream.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Opens a new connection authenticated with `token`.
    async fn open(&self, token: &str) -> Result<ByteStream, StreamError>;
}
