//! AggregateRecord - merged, field-level latest state for one room.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Timestamp;

/// Latest known value per field for a room, plus when it last changed.
///
/// Fields are independently last-write-wins. Updates are merged into the
/// record; a partial update never replaces fields it does not name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateRecord {
    #[serde(default)]
    fields: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<Timestamp>,
}

impl AggregateRecord {
    /// Creates an empty record (a room with no known state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the given fields, overwriting colliding ones.
    ///
    /// Returns the number of fields whose value actually changed.
    /// `last_updated` never moves backwards.
    pub fn merge<I>(&mut self, fields: I, at: Timestamp) -> usize
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut changed = 0;
        for (name, value) in fields {
            match self.fields.get(&name) {
                Some(existing) if *existing == value => {}
                _ => {
                    self.fields.insert(name, value);
                    changed += 1;
                }
            }
        }

        self.last_updated = Some(match self.last_updated {
            Some(previous) if previous.is_after(&at) => previous,
            _ => at,
        });

        changed
    }

    /// Returns the current value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns all fields in name order.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns when the record was last merged into.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.last_updated
    }

    /// Number of known fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is known.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes the record for the key-value store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a record previously written with [`AggregateRecord::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
