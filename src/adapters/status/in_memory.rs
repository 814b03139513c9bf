//! In-memory status collaborator for tests and runs without a status service.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::ports::{BuildingInfo, RoomInfo, RoomStatus, RoomStatusSource, StatusSourceError};

#[derive(Debug, Clone)]
struct BuildingEntry {
    info: BuildingInfo,
    rooms: BTreeMap<String, Map<String, Value>>,
}

/// Fixed set of buildings and room statuses, with optional injected failures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoomStatusSource {
    buildings: BTreeMap<String, BuildingEntry>,
    failing_buildings: HashSet<String>,
    failing_rooms: HashSet<(String, String)>,
    fail_listing: bool,
}

impl InMemoryRoomStatusSource {
    /// Creates a source with no buildings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room with its current status fields (creates the building).
    pub fn with_room(mut self, building: &str, room: &str, fields: Map<String, Value>) -> Self {
        self.buildings
            .entry(building.to_string())
            .or_insert_with(|| BuildingEntry {
                info: BuildingInfo::new(building),
                rooms: BTreeMap::new(),
            })
            .rooms
            .insert(room.to_string(), fields);
        self
    }

    /// Makes `list_rooms` fail for `building`.
    pub fn with_failing_building(mut self, building: &str) -> Self {
        self.failing_buildings.insert(building.to_string());
        self
    }

    /// Makes `get_room_status` fail for one room.
    pub fn with_failing_room(mut self, building: &str, room: &str) -> Self {
        self.failing_rooms
            .insert((building.to_string(), room.to_string()));
        self
    }

    /// Makes `list_buildings` fail.
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl RoomStatusSource for InMemoryRoomStatusSource {
    async fn list_buildings(&self) -> Result<Vec<BuildingInfo>, StatusSourceError> {
        if self.fail_listing {
            return Err(StatusSourceError::Request("building listing unavailable".into()));
        }
        Ok(self.buildings.values().map(|b| b.info.clone()).collect())
    }

    async fn list_rooms(&self, building: &str) -> Result<Vec<RoomInfo>, StatusSourceError> {
        if self.failing_buildings.contains(building) {
            return Err(StatusSourceError::Request(format!("rooms of {} unavailable", building)));
        }
        let entry = self
            .buildings
            .get(building)
            .ok_or_else(|| StatusSourceError::NotFound(building.to_string()))?;
        Ok(entry.rooms.keys().map(RoomInfo::new).collect())
    }

    async fn get_room_status(
        &self,
        building: &str,
        room: &str,
    ) -> Result<RoomStatus, StatusSourceError> {
        if self
            .failing_rooms
            .contains(&(building.to_string(), room.to_string()))
        {
            return Err(StatusSourceError::Status {
                status: 500,
                url: format!("memory://{}/{}", building, room),
            });
        }
        let fields = self
            .buildings
            .get(building)
            .and_then(|b| b.rooms.get(room))
            .ok_or_else(|| StatusSourceError::NotFound(format!("{}-{}", building, room)))?;
        Ok(RoomStatus::new(building, room, fields.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn lists_buildings_rooms_and_status() {
        let source = InMemoryRoomStatusSource::new()
            .with_room("ITB", "1101", fields(json!({"power": "on"})))
            .with_room("ITB", "1108", Map::new())
            .with_room("EB", "203", Map::new());

        let buildings = source.list_buildings().await.unwrap();
        let codes: Vec<_> = buildings.iter().map(|b| b.code().to_string()).collect();
        assert_eq!(codes, vec!["EB", "ITB"]);

        let rooms = source.list_rooms("ITB").await.unwrap();
        assert_eq!(rooms, vec![RoomInfo::new("1101"), RoomInfo::new("1108")]);

        let status = source.get_room_status("ITB", "1101").await.unwrap();
        assert_eq!(status.fields.get("power"), Some(&json!("on")));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let source = InMemoryRoomStatusSource::new()
            .with_room("ITB", "1101", Map::new())
            .with_failing_room("ITB", "1101")
            .with_failing_building("EB");

        assert!(source.get_room_status("ITB", "1101").await.is_err());
        assert!(source.list_rooms("EB").await.is_err());
        assert!(matches!(
            source.list_rooms("JKB").await,
            Err(StatusSourceError::NotFound(_))
        ));
    }
}
