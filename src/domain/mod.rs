//! Domain layer - pure types for the ingestion pipeline.
//!
//! - `foundation` - timestamps and the state machine trait
//! - `bus` - decoded bus events and sessions
//! - `room` - room keys, aggregate records and updates
//! - `lifecycle` - pipeline lifecycle states

pub mod bus;
pub mod foundation;
pub mod lifecycle;
pub mod room;
