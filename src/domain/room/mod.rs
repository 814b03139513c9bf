//! Room aggregation vocabulary.
//!
//! - `RoomKey` - the store key for a room
//! - `AggregateRecord` - merged latest state for a room
//! - `RoomUpdate` - the changes one bus event carries

mod key;
mod record;
mod update;

pub use key::{RoomKey, RoomKeyError};
pub use record::AggregateRecord;
pub use update::{RoomTarget, RoomUpdate, SkipReason};
