//! RawEvent - one decoded frame from the event bus.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An event as published on the bus: a tag plus an arbitrary JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub tag: String,

    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RawEvent {
    /// Creates an event from a tag and payload.
    pub fn new(tag: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            tag: tag.into(),
            data,
        }
    }

    /// Returns a top-level payload field if it is a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}
