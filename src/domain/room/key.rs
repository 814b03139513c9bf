//! RoomKey value object - the store key for one physical room.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a room key cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomKeyError {
    #[error("Building shortname is empty")]
    MissingBuilding,

    #[error("Room name is empty")]
    MissingRoom,
}

/// Composite `building-room` identifier.
///
/// Construction is deterministic: the same building and room always produce
/// the same key. Room names that already carry the building prefix (the bus
/// sends `room: "ITB-110"` alongside `building: "ITB"`) are not prefixed a
/// second time, so `("ITB", "110")` and `("ITB", "ITB-110")` both map to
/// `ITB-110`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Builds the key for a building shortname and room name.
    pub fn new(building: &str, room: &str) -> Result<Self, RoomKeyError> {
        let building = building.trim();
        let room = room.trim();

        if building.is_empty() {
            return Err(RoomKeyError::MissingBuilding);
        }
        if room.is_empty() {
            return Err(RoomKeyError::MissingRoom);
        }

        let already_prefixed = room
            .strip_prefix(building)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|rest| !rest.is_empty());

        if already_prefixed {
            Ok(Self(room.to_string()))
        } else {
            Ok(Self(format!("{}-{}", building, room)))
        }
    }

    /// Returns the key as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_building_and_room() {
        let key = RoomKey::new("ITB", "1101").unwrap();
        assert_eq!(key.as_str(), "ITB-1101");
    }

    #[test]
    fn prefixed_room_is_not_prefixed_twice() {
        let plain = RoomKey::new("ITB", "110").unwrap();
        let prefixed = RoomKey::new("ITB", "ITB-110").unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(prefixed.to_string(), "ITB-110");
    }

    #[test]
    fn bare_building_prefix_is_still_a_room_name() {
        // "ITB-" alone is not a prefixed room, it is an odd room name
        let key = RoomKey::new("ITB", "ITB-").unwrap();
        assert_eq!(key.as_str(), "ITB-ITB-");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let key = RoomKey::new(" EB ", " 203 ").unwrap();
        assert_eq!(key.as_str(), "EB-203");
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert_eq!(RoomKey::new("", "110"), Err(RoomKeyError::MissingBuilding));
        assert_eq!(RoomKey::new("ITB", "  "), Err(RoomKeyError::MissingRoom));
    }
}
