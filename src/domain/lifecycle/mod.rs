//! Pipeline lifecycle states.

use crate::domain::foundation::StateMachine;

/// Lifecycle of the running pipeline.
///
/// ```text
/// Running -> ShutdownRequested -> Draining -> Terminated
/// ```
///
/// `Running -> Draining` is also allowed so a shutdown can be broadcast
/// without an external signal (tests, fatal startup paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    ShutdownRequested,
    Draining,
    Terminated,
}

impl StateMachine for LifecycleState {
    fn valid_transitions(&self) -> Vec<Self> {
        use LifecycleState::*;
        match self {
            Running => vec![ShutdownRequested, Draining],
            ShutdownRequested => vec![Draining],
            Draining => vec![Terminated],
            Terminated => vec![],
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Running => "running",
            LifecycleState::ShutdownRequested => "shutdown_requested",
            LifecycleState::Draining => "draining",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
