//! DeviceDirectory port - resolves a device name to the room it lives in.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::room::RoomKey;

/// Errors raised by a device lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Device lookup failed: {0}")]
    Lookup(String),
}

/// Port for device-to-room resolution.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Returns the room of `device`, or `None` when it is unknown.
    async fn locate(&self, device: &str) -> Result<Option<RoomKey>, DirectoryError>;
}
