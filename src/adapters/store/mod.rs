//! Store Adapters
//!
//! Implementations of the KeyValueStore port for persisting room records.
//!
//! ## Available Adapters
//!
//! - **FileKeyValueStore** - One JSON file per room on disk
//! - **RedisKeyValueStore** - Shared Redis instance
//! - **InMemoryKeyValueStore** - In memory (testing/development)

mod file;
mod in_memory;
mod redis;

pub use self::file::FileKeyValueStore;
pub use self::in_memory::InMemoryKeyValueStore;
pub use self::redis::RedisKeyValueStore;
