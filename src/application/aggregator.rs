//! State Aggregator - merges bus events into per-room records.
//!
//! The aggregator is the only writer of the store. It seeds the store from
//! the bulk snapshot, then applies events from the dispatcher in arrival
//! order: read the room's record, merge the event's fields, write it back.
//! A failure on one event is logged and the event is dropped; the loop
//! always moves on to the next one.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::lifecycle::ShutdownSignal;
use crate::domain::bus::RawEvent;
use crate::domain::foundation::Timestamp;
use crate::domain::room::{AggregateRecord, RoomKey, RoomTarget, RoomUpdate};
use crate::ports::{DeviceDirectory, DirectoryError, KeyValueStore, RoomStatus, StoreError};

/// Failure to apply one update to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("Failed to read record: {0}")]
    Read(StoreError),

    #[error("Failed to write record: {0}")]
    Write(StoreError),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error(transparent)]
    Lookup(#[from] DirectoryError),
}

/// Aggregator settings.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// How long buffered events may still be applied after shutdown.
    pub flush_window: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_window: Duration::from_secs(2),
        }
    }
}

/// Counters reported when the aggregator stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    /// Snapshot entries written at startup.
    pub snapshot_rooms: u64,
    /// Events merged into a record.
    pub applied: u64,
    /// Events without a room or without field changes.
    pub skipped: u64,
    /// Events dropped because of a store or lookup failure.
    pub failed: u64,
    /// Buffered events left unapplied when the flush window ran out.
    pub abandoned: u64,
}

/// Reads the record stored for `key`; a missing record is empty.
pub async fn load_record(
    store: &dyn KeyValueStore,
    key: &RoomKey,
) -> Result<AggregateRecord, MergeError> {
    match store.get(key.as_str()).await.map_err(MergeError::Read)? {
        Some(bytes) => {
            AggregateRecord::from_bytes(&bytes).map_err(|e| MergeError::Corrupt(e.to_string()))
        }
        None => Ok(AggregateRecord::new()),
    }
}

/// Applies the snapshot and the event stream to the store.
pub struct StateAggregator {
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn DeviceDirectory>,
    config: AggregatorConfig,
}

impl StateAggregator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn DeviceDirectory>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    /// Applies `snapshot`, then events until shutdown or until every sender
    /// is gone. Closes the store before returning.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<RawEvent>,
        snapshot: Vec<RoomStatus>,
        mut shutdown: ShutdownSignal,
    ) -> AggregatorStats {
        let mut stats = AggregatorStats::default();

        self.apply_snapshot(snapshot, &mut stats).await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.fired() => {
                    info!("Shutdown received, draining buffered events");
                    self.drain(&mut events, &mut stats).await;
                    break;
                }
                next = events.recv() => match next {
                    Some(event) => self.apply_event(event, &mut stats).await,
                    None => {
                        info!("Event channel closed");
                        break;
                    }
                },
            }
        }

        if let Err(e) = self.store.close().await {
            warn!(error = %e, "Failed to close store");
        }

        info!(
            snapshot_rooms = stats.snapshot_rooms,
            applied = stats.applied,
            skipped = stats.skipped,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "State aggregator stopped"
        );
        stats
    }

    async fn apply_snapshot(&self, snapshot: Vec<RoomStatus>, stats: &mut AggregatorStats) {
        let total = snapshot.len();
        for status in snapshot {
            let key = match status.key() {
                Ok(key) => key,
                Err(e) => {
                    warn!(building = %status.building, room = %status.room, error = %e, "Skipping snapshot entry");
                    continue;
                }
            };

            match self.merge(&key, status.fields).await {
                Ok(_) => stats.snapshot_rooms += 1,
                Err(e) => {
                    stats.failed += 1;
                    warn!(room_key = %key, error = %e, "Failed to seed room from snapshot");
                }
            }
        }
        if total > 0 {
            info!(rooms = stats.snapshot_rooms, total, "Applied bulk snapshot");
        }
    }

    /// Stops accepting events and applies what is already buffered, for at
    /// most the flush window. An event still being applied when the window
    /// closes is abandoned along with the rest of the buffer.
    async fn drain(&self, events: &mut mpsc::Receiver<RawEvent>, stats: &mut AggregatorStats) {
        events.close();
        let deadline = Instant::now() + self.config.flush_window;

        let in_flight = loop {
            // A ready recv wins over an elapsed timer, so check the clock first.
            if Instant::now() >= deadline {
                break 0;
            }
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => {
                    if tokio::time::timeout_at(deadline, self.apply_event(event, stats))
                        .await
                        .is_err()
                    {
                        break 1;
                    }
                }
                Ok(None) => return,
                Err(_) => break 0,
            }
        };

        let mut abandoned = in_flight;
        while events.try_recv().is_ok() {
            abandoned += 1;
        }
        stats.abandoned += abandoned;
        warn!(abandoned, window = ?self.config.flush_window, "Flush window expired");
    }

    async fn apply_event(&self, event: RawEvent, stats: &mut AggregatorStats) {
        let update = match RoomUpdate::from_event(&event) {
            Ok(update) => update,
            Err(reason) => {
                stats.skipped += 1;
                debug!(tag = %event.tag, reason = %reason, "Skipping event");
                return;
            }
        };

        let key = match self.resolve(update.target).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                stats.skipped += 1;
                debug!(tag = %event.tag, "Skipping event from unknown device");
                return;
            }
            Err(e) => {
                stats.failed += 1;
                warn!(tag = %event.tag, error = %e, "Dropping event");
                return;
            }
        };

        match self.merge(&key, update.fields).await {
            Ok(changed) => {
                stats.applied += 1;
                debug!(room_key = %key, tag = %event.tag, changed, "Applied event");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(room_key = %key, tag = %event.tag, error = %e, "Dropping event");
            }
        }
    }

    async fn resolve(&self, target: RoomTarget) -> Result<Option<RoomKey>, MergeError> {
        match target {
            RoomTarget::Room(key) => Ok(Some(key)),
            RoomTarget::Device(device) => Ok(self.directory.locate(&device).await?),
        }
    }

    /// Read-merge-write of one record; returns the number of changed fields.
    async fn merge(&self, key: &RoomKey, fields: Map<String, Value>) -> Result<usize, MergeError> {
        let mut record = load_record(self.store.as_ref(), key).await?;
        let changed = record.merge(fields, Timestamp::now());

        let bytes = record
            .to_bytes()
            .map_err(|e| MergeError::Encode(e.to_string()))?;
        self.store
            .set(key.as_str(), bytes)
            .await
            .map_err(MergeError::Write)?;

        Ok(changed)
    }
}
