//! Device directory that reads the room out of the device hostname.
//!
//! Devices are named `BUILDING-ROOM-DEVICE` (for example `ITB-1101-D1`), so
//! the room is the first two dash-separated parts.

use async_trait::async_trait;

use crate::domain::room::RoomKey;
use crate::ports::{DeviceDirectory, DirectoryError};

/// Derives rooms from `BUILDING-ROOM-DEVICE` names. Never fails; names that
/// do not follow the convention are unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameDeviceDirectory;

impl HostnameDeviceDirectory {
    pub fn new() -> Self {
        Self
    }

    fn parse(device: &str) -> Option<RoomKey> {
        // Fully qualified names carry a domain after the first dot.
        let host = device.trim().split('.').next()?;
        let mut parts = host.splitn(3, '-');
        let building = parts.next()?;
        let room = parts.next()?;
        let name = parts.next()?;
        if name.is_empty() {
            return None;
        }
        RoomKey::new(building, room).ok()
    }
}

#[async_trait]
impl DeviceDirectory for HostnameDeviceDirectory {
    async fn locate(&self, device: &str) -> Result<Option<RoomKey>, DirectoryError> {
        Ok(Self::parse(device))
    }
}
