//! Mock bus adapters for testing.
//!
//! `MockBusAuthenticator` hands out numbered tokens and can be told to fail;
//! `ScriptedEventSource` replays a fixed list of connections.
//!
//! # Example
//!
//! ```ignore
//! let auth = MockBusAuthenticator::new().with_delay(Duration::from_millis(50));
//! let source = ScriptedEventSource::new()
//!     .with_connection(ScriptedConnection::new().chunk("tag: a\ndata: {}\n").then_close())
//!     .with_connection(ScriptedConnection::new().chunk("tag: b\ndata: {}\n"));
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::domain::bus::Session;
use crate::domain::foundation::Timestamp;
use crate::ports::{AuthError, BusAuthenticator, ByteStream, EventSource, StreamError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Authenticator that issues `token-1`, `token-2`, ... without any network.
#[derive(Debug)]
pub struct MockBusAuthenticator {
    logins: AtomicUsize,
    delay: Duration,
    session_ttl_secs: i64,
    failures: Mutex<VecDeque<AuthError>>,
}

impl Default for MockBusAuthenticator {
    fn default() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            delay: Duration::ZERO,
            session_ttl_secs: 3600,
            failures: Mutex::new(VecDeque::new()),
        }
    }
}

impl MockBusAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every login take `delay` (to widen concurrency windows).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets how long issued sessions stay valid; negative means already expired.
    pub fn with_session_ttl_secs(mut self, secs: i64) -> Self {
        self.session_ttl_secs = secs;
        self
    }

    /// Queues an error for the next login attempt.
    pub fn with_failure(self, error: AuthError) -> Self {
        lock(&self.failures).push_back(error);
        self
    }

    /// Number of login attempts made so far, failed ones included.
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BusAuthenticator for MockBusAuthenticator {
    async fn login(&self) -> Result<Session, AuthError> {
        let attempt = self.logins.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }

        Ok(Session::new(
            format!("token-{}", attempt),
            Timestamp::now().plus_secs(self.session_ttl_secs),
        )
        .with_user("mock"))
    }
}

/// How a scripted connection behaves once its chunks are used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    /// Stay open and silent until the reader drops it.
    Idle,
    /// End the stream (server closed the connection).
    Close,
}

/// One connection in an [`ScriptedEventSource`] script.
#[derive(Debug, Clone)]
pub struct ScriptedConnection {
    open_error: Option<StreamError>,
    items: Vec<Result<Vec<u8>, StreamError>>,
    ending: Ending,
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self {
            open_error: None,
            items: Vec::new(),
            ending: Ending::Idle,
        }
    }
}

impl ScriptedConnection {
    /// A connection that opens successfully and stays idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection attempt that fails at open time.
    pub fn refused(error: StreamError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    /// Appends a body chunk.
    pub fn chunk(mut self, text: impl AsRef<[u8]>) -> Self {
        self.items.push(Ok(text.as_ref().to_vec()));
        self
    }

    /// Appends a read error; the reader treats it as a dropped connection.
    pub fn fail(mut self, error: StreamError) -> Self {
        self.items.push(Err(error));
        self
    }

    /// Ends the stream after the scripted chunks.
    pub fn then_close(mut self) -> Self {
        self.ending = Ending::Close;
        self
    }
}

/// Event source that replays scripted connections in order.
///
/// Once the script is exhausted every further open yields an idle stream.
#[derive(Debug, Default)]
pub struct ScriptedEventSource {
    script: Mutex<VecDeque<ScriptedConnection>>,
    tokens: Mutex<Vec<String>>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a connection to the script.
    pub fn with_connection(self, connection: ScriptedConnection) -> Self {
        lock(&self.script).push_back(connection);
        self
    }

    /// Tokens passed to each `open` call, in order.
    pub fn tokens_used(&self) -> Vec<String> {
        lock(&self.tokens).clone()
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        lock(&self.tokens).len()
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn open(&self, token: &str) -> Result<ByteStream, StreamError> {
        lock(&self.tokens).push(token.to_string());

        let connection = lock(&self.script).pop_front().unwrap_or_default();
        if let Some(error) = connection.open_error {
            return Err(error);
        }

        let body = stream::iter(connection.items);
        let chunks: ByteStream = match connection.ending {
            Ending::Close => Box::pin(body),
            Ending::Idle => Box::pin(body.chain(stream::pending())),
        };
        Ok(chunks)
    }
}
