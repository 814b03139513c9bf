//! Event Dispatcher - the bounded hand-off from reader to aggregator.
//!
//! A full channel suspends the reader's `send`, so a slow aggregator slows
//! consumption of the bus stream instead of buffering without bound.

use tokio::sync::mpsc;

use crate::domain::bus::RawEvent;

/// Capacity used when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Creates the reader-to-aggregator channel. A zero capacity is raised to 1.
pub fn event_channel(capacity: usize) -> (mpsc::Sender<RawEvent>, mpsc::Receiver<RawEvent>) {
    mpsc::channel(capacity.max(1))
}
