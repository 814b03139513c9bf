//! Event bus vocabulary: decoded events, authenticated sessions and the
//! session manager's phases.

mod event;
mod phase;
mod session;

pub use event::RawEvent;
pub use phase::SessionPhase;
pub use session::Session;
