//! RoomUpdate - the field changes a bus event carries for one room.
//!
//! Events reach the bus in a few shapes. All of these are understood:
//!
//! ```text
//! {"building": "ITB", "room": "ITB-110", "field": "volume", "value": "30"}
//! {"building": "ITB", "room": "110", "event": {"device": "D1", "eventInfoKey": "power", "eventInfoValue": "on"}}
//! {"device": "ITB-110-D1", "fields": {"power": "on", "input": "hdmi2"}}
//! ```
//!
//! The room comes from `building` + `room` when both are present, otherwise
//! from a `device` name that a device directory has to resolve.

use serde_json::{Map, Value};
use thiserror::Error;

use super::key::{RoomKey, RoomKeyError};
use crate::domain::bus::RawEvent;

/// Where an update should be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomTarget {
    /// The event named its room directly.
    Room(RoomKey),
    /// The event only named a device; the room must be looked up.
    Device(String),
}

/// Why an event produced no update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("event names no room or device")]
    NoTarget,

    #[error("event carries no field changes")]
    NoFields,

    #[error("invalid room identity: {0}")]
    InvalidRoom(#[from] RoomKeyError),
}

/// Field changes extracted from one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomUpdate {
    pub target: RoomTarget,
    pub fields: Map<String, Value>,
}

impl RoomUpdate {
    /// Extracts the update an event carries.
    pub fn from_event(event: &RawEvent) -> Result<Self, SkipReason> {
        let data = &event.data;
        let nested = data.get("event").and_then(Value::as_object);

        let fields = extract_fields(data, nested);
        if fields.is_empty() {
            return Err(SkipReason::NoFields);
        }

        let building = lookup_str(data, nested, "building");
        let room = lookup_str(data, nested, "room");
        let device = lookup_str(data, nested, "device");

        let target = match (building, room, device) {
            (Some(building), Some(room), _) => RoomTarget::Room(RoomKey::new(building, room)?),
            (_, _, Some(device)) if !device.trim().is_empty() => {
                RoomTarget::Device(device.trim().to_string())
            }
            _ => return Err(SkipReason::NoTarget),
        };

        Ok(Self { target, fields })
    }
}

fn lookup_str<'a>(
    data: &'a Map<String, Value>,
    nested: Option<&'a Map<String, Value>>,
    name: &str,
) -> Option<&'a str> {
    data.get(name)
        .and_then(Value::as_str)
        .or_else(|| nested.and_then(|n| n.get(name)).and_then(Value::as_str))
}

fn extract_fields(data: &Map<String, Value>, nested: Option<&Map<String, Value>>) -> Map<String, Value> {
    if let Some(fields) = data.get("fields").and_then(Value::as_object) {
        return fields
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
    }

    let pair = field_pair(data, "field", "value")
        .or_else(|| field_pair(data, "eventInfoKey", "eventInfoValue"))
        .or_else(|| nested.and_then(|n| field_pair(n, "field", "value")))
        .or_else(|| nested.and_then(|n| field_pair(n, "eventInfoKey", "eventInfoValue")));

    pair.into_iter().collect()
}

fn field_pair(scope: &Map<String, Value>, key: &str, value: &str) -> Option<(String, Value)> {
    let name = scope.get(key).and_then(Value::as_str)?;
    if name.is_empty() {
        return None;
    }
    let value = scope.get(value)?;
    Some((name.to_string(), value.clone()))
}
