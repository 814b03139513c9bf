//! KeyValueStore port - Interface for the durable room-state store.
//!
//! The pipeline treats the store as an opaque durable map from key to bytes.
//! Merge semantics live in the aggregator, not here.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Store is closed")]
    Closed,
}

/// Port for a durable byte-valued key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value; `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Flushes and releases the store. Later calls fail with
    /// [`StoreError::Closed`].
    async fn close(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn KeyValueStore) {}

    #[test]
    fn io_error_display() {
        let err = StoreError::Io("disk full".to_string());
        assert_eq!(err.to_string(), "IO error: disk full");
    }
}
