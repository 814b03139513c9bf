//! Status collaborator adapters (bulk snapshot source).

mod http;
mod in_memory;

pub use http::HttpRoomStatusSource;
pub use in_memory::InMemoryRoomStatusSource;
