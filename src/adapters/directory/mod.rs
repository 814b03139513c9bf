//! Device directory adapters.

mod hostname;
mod in_memory;

pub use hostname::HostnameDeviceDirectory;
pub use in_memory::InMemoryDeviceDirectory;
