//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the pipeline to external systems:
//! - `event_bus` - Bus login and event stream (HTTP, scripted mocks)
//! - `store` - Key-value stores (in-memory, file, Redis)
//! - `status` - Room status collaborator (HTTP, in-memory)
//! - `directory` - Device-to-room lookup (hostname convention, in-memory)

pub mod directory;
pub mod event_bus;
pub mod status;
pub mod store;

pub use directory::{HostnameDeviceDirectory, InMemoryDeviceDirectory};
pub use event_bus::{
    BusClientConfig, HttpBusAuthenticator, HttpEventSource, MockBusAuthenticator,
    ScriptedConnection, ScriptedEventSource,
};
pub use status::{HttpRoomStatusSource, InMemoryRoomStatusSource};
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, RedisKeyValueStore};
