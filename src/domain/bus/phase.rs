//! Session manager phases.

use crate::domain::foundation::StateMachine;

/// Where the session manager is in acquiring a token.
///
/// ```text
/// Uninitialized -> Initializing -> Ready | Failed
/// Ready | Failed -> Initializing   (refresh / retry)
/// Ready | Failed -> Uninitialized  (invalidate)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl StateMachine for SessionPhase {
    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Uninitialized => vec![Initializing],
            Initializing => vec![Ready, Failed],
            Ready => vec![Initializing, Uninitialized],
            Failed => vec![Initializing, Uninitialized],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_attempt_ends_ready_or_failed() {
        let phase = SessionPhase::Uninitialized
            .transition_to(SessionPhase::Initializing)
            .unwrap();
        assert!(phase.can_transition_to(&SessionPhase::Ready));
        assert!(phase.can_transition_to(&SessionPhase::Failed));
        assert!(!phase.can_transition_to(&SessionPhase::Uninitialized));
    }

    #[test]
    fn uninitialized_cannot_skip_to_ready() {
        assert!(SessionPhase::Uninitialized
            .transition_to(SessionPhase::Ready)
            .is_err());
    }

    #[test]
    fn no_phase_is_terminal() {
        for phase in [
            SessionPhase::Uninitialized,
            SessionPhase::Initializing,
            SessionPhase::Ready,
            SessionPhase::Failed,
        ] {
            assert!(!phase.is_terminal());
        }
    }
}
