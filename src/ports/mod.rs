//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the ingestion pipeline and the outside world. Adapters implement these
//! ports.
//!
//! ## Event Bus Ports
//!
//! - `BusAuthenticator` - Login against the bus
//! - `EventSource` - Open the long-lived event stream
//!
//! ## Collaborator Ports
//!
//! - `RoomStatusSource` - Buildings, rooms and room status for the snapshot
//! - `DeviceDirectory` - Device-to-room lookup
//!
//! ## Storage Ports
//!
//! - `KeyValueStore` - Durable store for aggregate records

mod bus_authenticator;
mod device_directory;
mod event_source;
mod key_value_store;
mod room_status_source;

pub use bus_authenticator::{AuthError, BusAuthenticator};
pub use device_directory::{DeviceDirectory, DirectoryError};
pub use event_source::{ByteStream, EventSource, StreamError};
pub use key_value_store::{KeyValueStore, StoreError};
pub use room_status_source::{
    BuildingInfo, RoomInfo, RoomStatus, RoomStatusSource, StatusSourceError,
};
