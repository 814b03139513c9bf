//! Bulk snapshot loading.
//!
//! Walks the status collaborator once at startup (buildings, then rooms,
//! then each room's status). A failure anywhere only loses that building or
//! room; the rest of the snapshot still loads.

use tracing::{info, warn};

use super::lifecycle::ShutdownSignal;
use crate::ports::{RoomStatus, RoomStatusSource};

/// Collects the current status of every known room.
pub async fn load_initial_snapshot(source: &dyn RoomStatusSource) -> Vec<RoomStatus> {
    let buildings = match source.list_buildings().await {
        Ok(buildings) => buildings,
        Err(e) => {
            warn!(error = %e, "Failed to list buildings, starting without snapshot");
            return Vec::new();
        }
    };

    let mut snapshot = Vec::new();
    for building in &buildings {
        let code = building.code();
        let rooms = match source.list_rooms(code).await {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(building = %code, error = %e, "Failed to list rooms, skipping building");
                continue;
            }
        };

        for room in rooms {
            match source.get_room_status(code, &room.name).await {
                Ok(status) => snapshot.push(status),
                Err(e) => {
                    warn!(building = %code, room = %room.name, error = %e, "Failed to get room status, skipping room");
                }
            }
        }
    }

    info!(
        buildings = buildings.len(),
        rooms = snapshot.len(),
        "Loaded bulk snapshot"
    );
    snapshot
}

/// Loads the snapshot unless shutdown is broadcast first; `None` when the
/// walk was cut short.
pub async fn load_snapshot_until_shutdown(
    source: &dyn RoomStatusSource,
    shutdown: &mut ShutdownSignal,
) -> Option<Vec<RoomStatus>> {
    tokio::select! {
        biased;
        _ = shutdown.fired() => {
            info!("Shutdown received while loading snapshot");
            None
        }
        snapshot = load_initial_snapshot(source) => Some(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::status::InMemoryRoomStatusSource;
    use crate::application::lifecycle::LifecycleCoordinator;
    use crate::ports::{BuildingInfo, RoomInfo, StatusSourceError};
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn source() -> InMemoryRoomStatusSource {
        InMemoryRoomStatusSource::new()
            .with_room("ITB", "1101", json!({"power": "on"}).as_object().cloned().unwrap())
            .with_room("ITB", "1108", Map::new())
            .with_room("EB", "203", Map::new())
    }

    fn keys(snapshot: &[RoomStatus]) -> Vec<String> {
        snapshot
            .iter()
            .map(|s| s.key().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn loads_every_room() {
        let snapshot = load_initial_snapshot(&source()).await;
        assert_eq!(keys(&snapshot), vec!["EB-203", "ITB-1101", "ITB-1108"]);
    }

    #[tokio::test]
    async fn failing_room_is_skipped() {
        let snapshot = load_initial_snapshot(&source().with_failing_room("ITB", "1101")).await;
        assert_eq!(keys(&snapshot), vec!["EB-203", "ITB-1108"]);
    }

    #[tokio::test]
    async fn failing_building_is_skipped() {
        let snapshot = load_initial_snapshot(&source().with_failing_building("EB")).await;
        assert_eq!(keys(&snapshot), vec!["ITB-1101", "ITB-1108"]);
    }

    #[tokio::test]
    async fn failed_listing_yields_empty_snapshot() {
        let snapshot = load_initial_snapshot(&source().with_failing_listing()).await;
        assert!(snapshot.is_empty());
    }

    /// Status service that never answers.
    struct HangingSource;

    #[async_trait]
    impl RoomStatusSource for HangingSource {
        async fn list_buildings(&self) -> Result<Vec<BuildingInfo>, StatusSourceError> {
            futures::future::pending().await
        }

        async fn list_rooms(&self, _building: &str) -> Result<Vec<RoomInfo>, StatusSourceError> {
            futures::future::pending().await
        }

        async fn get_room_status(&self, _building: &str, _room: &str) -> Result<RoomStatus, StatusSourceError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_cuts_a_hanging_snapshot_load() {
        let mut lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let mut signal = lifecycle.signal();

        let load = tokio::spawn(async move { load_snapshot_until_shutdown(&HangingSource, &mut signal).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        lifecycle.broadcast();

        let result = tokio::time::timeout(Duration::from_secs(2), load)
            .await
            .expect("snapshot load should stop on shutdown")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn snapshot_completes_without_shutdown() {
        let lifecycle = LifecycleCoordinator::new(Duration::from_secs(1));
        let mut signal = lifecycle.signal();

        let snapshot = load_snapshot_until_shutdown(&source(), &mut signal).await.unwrap();
        assert_eq!(snapshot.len(), 3);
    }
}
