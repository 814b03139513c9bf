//! In-memory device directory for tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::room::RoomKey;
use crate::ports::{DeviceDirectory, DirectoryError};

/// Explicit device-to-room table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceDirectory {
    devices: HashMap<String, RoomKey>,
    unavailable: bool,
}

impl InMemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device.
    pub fn with_device(mut self, device: impl Into<String>, room: RoomKey) -> Self {
        self.devices.insert(device.into(), room);
        self
    }

    /// Makes every lookup fail.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl DeviceDirectory for InMemoryDeviceDirectory {
    async fn locate(&self, device: &str) -> Result<Option<RoomKey>, DirectoryError> {
        if self.unavailable {
            return Err(DirectoryError::Lookup(format!("directory unavailable for {}", device)));
        }
        Ok(self.devices.get(device).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn locates_registered_devices() {
        let room = RoomKey::new("ITB", "1101").unwrap();
        let directory = InMemoryDeviceDirectory::new().with_device("proj-7", room.clone());

        assert_eq!(directory.locate("proj-7").await.unwrap(), Some(room));
        assert_eq!(directory.locate("proj-8").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unavailable_directory_fails() {
        let directory = InMemoryDeviceDirectory::new().unavailable();
        assert!(directory.locate("proj-7").await.is_err());
    }
}
