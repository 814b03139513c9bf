//! Stream Reader - consumes the bus event stream and feeds the dispatcher.
//!
//! One connection at a time: log in (through the session manager), open the
//! stream, split it into frames and send each decoded event downstream.
//! Any connection loss leads to a reconnect after a fixed delay until
//! shutdown is broadcast or the aggregator goes away.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::lifecycle::ShutdownSignal;
use super::session_manager::SessionManager;
use crate::adapters::event_bus::{Decoded, FrameDecoder, LineBuffer};
use crate::domain::bus::RawEvent;
use crate::ports::{AuthError, EventSource, StreamError};

/// Stream reader settings.
#[derive(Debug, Clone)]
pub struct StreamReaderConfig {
    /// Pause between a lost connection (or failed login) and the next attempt.
    pub reconnect_delay: Duration,
}

impl Default for StreamReaderConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Counters reported when the reader stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Events handed to the dispatcher.
    pub dispatched: u64,
    /// Frames whose payload failed to decode, and lines over the size limit.
    pub decode_errors: u64,
    /// Incomplete frames (tag without data, data without tag).
    pub skipped_frames: u64,
    /// Connection attempts after the first one.
    pub reconnects: u64,
}

/// Why one connection ended.
#[derive(Debug)]
enum Disconnect {
    Shutdown,
    ReceiverClosed,
    Login(AuthError),
    Stream(StreamError),
}

/// Reads the bus event stream.
pub struct StreamReader {
    sessions: Arc<SessionManager>,
    source: Arc<dyn EventSource>,
    config: StreamReaderConfig,
}

impl StreamReader {
    pub fn new(
        sessions: Arc<SessionManager>,
        source: Arc<dyn EventSource>,
        config: StreamReaderConfig,
    ) -> Self {
        Self {
            sessions,
            source,
            config,
        }
    }

    /// Runs until shutdown is broadcast or the receiving side of `out` is
    /// closed, reconnecting as often as needed.
    pub async fn run(&self, out: mpsc::Sender<RawEvent>, mut shutdown: ShutdownSignal) -> ReaderStats {
        let mut stats = ReaderStats::default();
        let mut first_attempt = true;

        loop {
            if shutdown.is_fired() || out.is_closed() {
                break;
            }

            if !first_attempt {
                stats.reconnects += 1;
                let resumed = tokio::select! {
                    biased;
                    _ = shutdown.fired() => false,
                    _ = tokio::time::sleep(self.config.reconnect_delay) => true,
                };
                if !resumed {
                    break;
                }
            }
            first_attempt = false;

            match self.read_connection(&out, &mut shutdown, &mut stats).await {
                Disconnect::Shutdown => break,
                Disconnect::ReceiverClosed => {
                    info!("Event channel closed, stopping stream reader");
                    break;
                }
                Disconnect::Login(e) => {
                    warn!(error = %e, delay = ?self.config.reconnect_delay, "Cannot log into event bus, retrying");
                }
                Disconnect::Stream(e) => {
                    if shutdown.is_fired() {
                        break;
                    }
                    if e.is_auth_related() {
                        self.sessions.invalidate().await;
                    }
                    warn!(error = %e, delay = ?self.config.reconnect_delay, "Event stream lost, reconnecting");
                }
            }
        }

        info!(
            dispatched = stats.dispatched,
            decode_errors = stats.decode_errors,
            skipped_frames = stats.skipped_frames,
            reconnects = stats.reconnects,
            "Stream reader stopped"
        );
        stats
    }

    /// Reads one connection from login to disconnect.
    async fn read_connection(
        &self,
        out: &mpsc::Sender<RawEvent>,
        shutdown: &mut ShutdownSignal,
        stats: &mut ReaderStats,
    ) -> Disconnect {
        let session = tokio::select! {
            biased;
            _ = shutdown.fired() => return Disconnect::Shutdown,
            result = self.sessions.get_session() => match result {
                Ok(session) => session,
                Err(e) => return Disconnect::Login(e),
            },
        };

        let mut body = tokio::select! {
            biased;
            _ = shutdown.fired() => return Disconnect::Shutdown,
            result = self.source.open(session.token()) => match result {
                Ok(body) => body,
                Err(e) => return Disconnect::Stream(e),
            },
        };
        info!("Event stream opened");

        // Decoder state never crosses connections: a frame cut by the drop is lost.
        let mut lines = LineBuffer::new();
        let mut frames = FrameDecoder::new();

        let end = loop {
            let chunk = tokio::select! {
                biased;
                _ = shutdown.fired() => break Disconnect::Shutdown,
                next = body.next() => next,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => break Disconnect::Stream(e),
                None => break Disconnect::Stream(StreamError::Closed),
            };

            for line in lines.push(&bytes) {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        stats.decode_errors += 1;
                        if frames.reset() {
                            stats.skipped_frames += 1;
                        }
                        warn!(error = %error, "Discarding oversized line");
                        continue;
                    }
                };

                match frames.push_line(&line) {
                    None => {}
                    Some(Decoded::Event(event)) => {
                        debug!(tag = %event.tag, "Dispatching event");
                        tokio::select! {
                            biased;
                            _ = shutdown.fired() => return Disconnect::Shutdown,
                            sent = out.send(event) => {
                                if sent.is_err() {
                                    return Disconnect::ReceiverClosed;
                                }
                            }
                        }
                        stats.dispatched += 1;
                    }
                    Some(Decoded::Malformed { tag, error }) => {
                        stats.decode_errors += 1;
                        warn!(tag = %tag, error = %error, "Discarding malformed event");
                    }
                    Some(Decoded::Skipped) => {
                        stats.skipped_frames += 1;
                        debug!("Skipping incomplete frame");
                    }
                }
            }
        };

        if frames.has_pending_frame() || lines.has_partial() {
            debug!("Partial frame dropped with the connection");
        }
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::event_bus::{MockBusAuthenticator, ScriptedConnection, ScriptedEventSource};
    use crate::application::dispatcher::event_channel;
    use crate::application::lifecycle::LifecycleCoordinator;
    use crate::ports::BusAuthenticator;

    fn frame(tag: &str, n: u32) -> String {
        format!("tag: {tag}\ndata: {{\"tag\":\"{tag}\",\"data\":{{\"n\":{n}}}}}\n\n")
    }

    fn reader(
        auth: Arc<MockBusAuthenticator>,
        source: Arc<ScriptedEventSource>,
    ) -> StreamReader {
        let sessions = Arc::new(SessionManager::new(auth as Arc<dyn BusAuthenticator>));
        StreamReader::new(
            sessions,
            source as Arc<dyn EventSource>,
            StreamReaderConfig {
                reconnect_delay: Duration::from_millis(5),
            },
        )
    }

    async fn collect(rx: &mut mpsc::Receiver<RawEvent>, count: usize) -> Vec<RawEvent> {
        let mut events = Vec::new();
        for _ in 0..count {
            let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("channel closed early");
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn dispatches_events_and_stops_on_shutdown() {
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::new()
                .chunk("retry: 400\n\n")
                .chunk(frame("a", 1))
                .chunk(frame("b", 2)),
        ));
        let auth = Arc::new(MockBusAuthenticator::new());
        let reader = reader(Arc::clone(&auth), Arc::clone(&source));
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        let events = collect(&mut rx, 2).await;
        assert_eq!(events[0].tag, "a");
        assert_eq!(events[1].tag, "b");

        lifecycle.broadcast();
        let stats = task.await.unwrap();
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.reconnects, 0);
        assert_eq!(source.tokens_used(), vec!["token-1"]);
    }

    #[tokio::test]
    async fn reconnect_loses_only_the_cut_frame() {
        let first = format!("{}{}", frame("e1", 1), frame("e2", 2));
        let cut = "tag: e3\ndata: {\"tag\":\"e3\",\"da";
        let source = Arc::new(
            ScriptedEventSource::new()
                .with_connection(
                    ScriptedConnection::new()
                        .chunk(first)
                        .chunk(cut)
                        .fail(StreamError::Read("connection reset".into())),
                )
                .with_connection(ScriptedConnection::new().chunk(frame("e4", 4))),
        );
        let reader = reader(Arc::new(MockBusAuthenticator::new()), Arc::clone(&source));
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        let tags: Vec<_> = collect(&mut rx, 3).await.into_iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec!["e1", "e2", "e4"]);

        lifecycle.broadcast();
        let stats = task.await.unwrap();
        assert_eq!(stats.dispatched, 3);
        assert_eq!(stats.reconnects, 1);
        // A transport error keeps the session.
        assert_eq!(source.tokens_used(), vec!["token-1", "token-1"]);
    }

    #[tokio::test]
    async fn unauthorized_stream_forces_new_login() {
        let source = Arc::new(
            ScriptedEventSource::new()
                .with_connection(ScriptedConnection::refused(StreamError::Unauthorized {
                    status: 401,
                }))
                .with_connection(ScriptedConnection::new().chunk(frame("ok", 1))),
        );
        let auth = Arc::new(MockBusAuthenticator::new());
        let reader = reader(Arc::clone(&auth), Arc::clone(&source));
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        assert_eq!(collect(&mut rx, 1).await[0].tag, "ok");
        lifecycle.broadcast();
        task.await.unwrap();

        assert_eq!(auth.login_count(), 2);
        assert_eq!(source.tokens_used(), vec!["token-1", "token-2"]);
    }

    #[tokio::test]
    async fn failed_login_is_retried() {
        let source = Arc::new(
            ScriptedEventSource::new().with_connection(ScriptedConnection::new().chunk(frame("x", 1))),
        );
        let auth = Arc::new(
            MockBusAuthenticator::new().with_failure(AuthError::Rejected { status: 401 }),
        );
        let reader = reader(Arc::clone(&auth), Arc::clone(&source));
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        assert_eq!(collect(&mut rx, 1).await[0].tag, "x");
        lifecycle.broadcast();
        let stats = task.await.unwrap();

        assert_eq!(stats.reconnects, 1);
        assert_eq!(source.tokens_used(), vec!["token-2"]);
    }

    #[tokio::test]
    async fn malformed_and_incomplete_frames_are_counted() {
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::new()
                .chunk("tag: bad\ndata: {oops\n\n")
                .chunk("data: {\"tag\":\"orphan\"}\n")
                .chunk(frame("good", 1)),
        ));
        let reader = reader(Arc::new(MockBusAuthenticator::new()), source);
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        assert_eq!(collect(&mut rx, 1).await[0].tag, "good");
        lifecycle.broadcast();
        let stats = task.await.unwrap();

        assert_eq!(stats.decode_errors, 1);
        assert_eq!(stats.skipped_frames, 1);
        assert_eq!(stats.dispatched, 1);
    }

    #[tokio::test]
    async fn closed_receiver_stops_reader() {
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::new().chunk(format!("{}{}", frame("a", 1), frame("b", 2))),
        ));
        let reader = reader(Arc::new(MockBusAuthenticator::new()), source);
        let lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, rx) = event_channel(8);
        drop(rx);

        let stats = tokio::time::timeout(Duration::from_secs(2), reader.run(tx, lifecycle.signal()))
            .await
            .expect("reader should stop once the channel is closed");
        assert_eq!(stats.dispatched, 0);
    }

    #[tokio::test]
    async fn shutdown_interrupts_reconnect_delay() {
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::refused(StreamError::Connect("refused".into())),
        ));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(MockBusAuthenticator::new()) as Arc<dyn BusAuthenticator>
        ));
        let reader = StreamReader::new(
            sessions,
            source as Arc<dyn EventSource>,
            StreamReaderConfig {
                reconnect_delay: Duration::from_secs(3600),
            },
        );
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, _rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        lifecycle.broadcast();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("reader should not sleep through shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_dispatch_between_frames_of_one_chunk() {
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::new().chunk(format!("{}{}{}", frame("a", 1), frame("b", 2), frame("c", 3))),
        ));
        let reader = reader(Arc::new(MockBusAuthenticator::new()), source);
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(1);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        // "a" fills the channel; the reader waits to send "b".
        tokio::time::sleep(Duration::from_millis(50)).await;
        lifecycle.broadcast();

        let stats = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("reader should stop while blocked on a full channel")
            .unwrap();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(rx.recv().await.map(|e| e.tag), Some("a".to_string()));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn oversized_line_is_dropped_and_stream_continues() {
        let flood = format!("tag: huge\ndata: {}", "x".repeat(crate::adapters::event_bus::MAX_LINE_BYTES + 1));
        let source = Arc::new(ScriptedEventSource::new().with_connection(
            ScriptedConnection::new()
                .chunk(flood)
                .chunk("\n\n")
                .chunk(frame("after", 1)),
        ));
        let reader = reader(Arc::new(MockBusAuthenticator::new()), source);
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let (tx, mut rx) = event_channel(8);

        let signal = lifecycle.signal();
        let task = tokio::spawn(async move { reader.run(tx, signal).await });

        assert_eq!(collect(&mut rx, 1).await[0].tag, "after");
        lifecycle.broadcast();
        let stats = task.await.unwrap();

        assert_eq!(stats.decode_errors, 1);
        assert_eq!(stats.skipped_frames, 1);
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.reconnects, 0);
    }
}
