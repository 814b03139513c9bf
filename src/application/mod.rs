//! Application layer - the pipeline components.
//!
//! Data flows Session Manager → Stream Reader → dispatcher channel → State
//! Aggregator → store. The Lifecycle Coordinator supervises the reader and
//! aggregator tasks from the side.

pub mod aggregator;
pub mod dispatcher;
pub mod lifecycle;
pub mod session_manager;
pub mod snapshot;
pub mod stream_reader;

pub use aggregator::{load_record, AggregatorConfig, AggregatorStats, MergeError, StateAggregator};
pub use dispatcher::{event_channel, DEFAULT_CHANNEL_CAPACITY};
pub use lifecycle::{
    wait_for_signal, LifecycleCoordinator, LifecycleError, ShutdownSignal, ShutdownStallError,
};
pub use session_manager::SessionManager;
pub use snapshot::{load_initial_snapshot, load_snapshot_until_shutdown};
pub use stream_reader::{ReaderStats, StreamReader, StreamReaderConfig};
