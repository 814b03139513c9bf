//! HTTP event stream adapter.
//!
//! `GET {base}/events` with the session token in `X-Auth-Token`. The body is
//! an unbounded text stream; this adapter hands out raw chunks and leaves
//! framing to the stream reader.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use super::client::BusClientConfig;
use crate::ports::{ByteStream, EventSource, StreamError};

/// Header carrying the bus session token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Opens the bus event stream over HTTP.
pub struct HttpEventSource {
    config: BusClientConfig,
    client: Client,
}

impl HttpEventSource {
    /// Creates a source; fails only if the HTTP client cannot be built.
    pub fn new(config: BusClientConfig) -> Result<Self, StreamError> {
        let client = config
            .build_client()
            .map_err(|e| StreamError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self, token: &str) -> Result<ByteStream, StreamError> {
        let response = self
            .client
            .get(self.config.url("events"))
            .header(AUTH_TOKEN_HEADER, token)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StreamError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url = %self.config.url("events"), "Event stream connected");

        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| StreamError::Read(e.to_string()))
        });

        Ok(Box::pin(chunks))
    }
}
