//! RoomStatusSource port - the configuration/status collaborator.
//!
//! Used once at startup to build the bulk snapshot that seeds the store:
//! list buildings, list the rooms of each building, fetch each room's status.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::room::{RoomKey, RoomKeyError};

/// Errors raised by the status collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusSourceError {
    #[error("Status request failed: {0}")]
    Request(String),

    #[error("Status endpoint {url} returned {status}")]
    Status { status: u16, url: String },

    #[error("Failed to decode status response: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// A building as listed by the configuration database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingInfo {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub shortname: String,
}

impl BuildingInfo {
    /// Creates a building whose name and shortname are the same.
    pub fn new(shortname: impl Into<String>) -> Self {
        let shortname = shortname.into();
        Self {
            name: shortname.clone(),
            shortname,
        }
    }

    /// The identifier used in room keys: the shortname when present.
    pub fn code(&self) -> &str {
        if self.shortname.is_empty() {
            &self.name
        } else {
            &self.shortname
        }
    }
}

/// A room as listed by the configuration database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub name: String,
}

impl RoomInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Current status of one room (one entry of the bulk snapshot).
#[derive(Debug, Clone, PartialEq)]
pub struct RoomStatus {
    pub building: String,
    pub room: String,
    pub fields: Map<String, Value>,
}

impl RoomStatus {
    /// Creates a status entry.
    pub fn new(building: impl Into<String>, room: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            building: building.into(),
            room: room.into(),
            fields,
        }
    }

    /// Builds a status entry from a status API document.
    ///
    /// Every top-level attribute except the identity pair becomes a field;
    /// a non-object document yields no fields.
    pub fn from_document(building: &str, room: &str, document: Value) -> Self {
        let fields = match document {
            Value::Object(map) => map
                .into_iter()
                .filter(|(name, _)| name != "building" && name != "room")
                .collect(),
            _ => Map::new(),
        };
        Self::new(building, room, fields)
    }

    /// The store key of this room.
    pub fn key(&self) -> Result<RoomKey, RoomKeyError> {
        RoomKey::new(&self.building, &self.room)
    }
}

/// Port for the configuration/status collaborator.
#[async_trait]
pub trait RoomStatusSource: Send + Sync {
    /// Lists all known buildings.
    async fn list_buildings(&self) -> Result<Vec<BuildingInfo>, StatusSourceError>;

    /// Lists the rooms of one building.
    async fn list_rooms(&self, building: &str) -> Result<Vec<RoomInfo>, StatusSourceError>;

    /// Fetches the current status of one room.
    async fn get_room_status(&self, building: &str, room: &str) -> Result<RoomStatus, StatusSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn building_code_prefers_shortname() {
        let building = BuildingInfo {
            name: "Information Technology Building".to_string(),
            shortname: "ITB".to_string(),
        };
        assert_eq!(building.code(), "ITB");

        let unnamed = BuildingInfo {
            name: "EB".to_string(),
            shortname: String::new(),
        };
        assert_eq!(unnamed.code(), "EB");
    }

    #[test]
    fn status_document_drops_identity_fields() {
        let status = RoomStatus::from_document(
            "ITB",
            "1101",
            json!({"building": "ITB", "room": "1101", "power": "on", "volume": 40}),
        );

        assert_eq!(status.fields.len(), 2);
        assert_eq!(status.fields.get("power"), Some(&json!("on")));
        assert_eq!(status.key().unwrap().as_str(), "ITB-1101");
    }

    #[test]
    fn non_object_document_has_no_fields() {
        let status = RoomStatus::from_document("ITB", "1101", json!(["unexpected"]));
        assert!(status.fields.is_empty());
    }
}
