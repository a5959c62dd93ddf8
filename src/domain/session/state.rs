//! Streaming session and server lifecycle state machines.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

/// Streaming session lifecycle: `Opening -> Streaming -> Closed`.
///
/// `Opening` may also go straight to `Closed` when admission or the worker
/// claim fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Opening,
    Streaming,
    Closed,
}

impl StateMachine for SessionState {
    fn valid_transitions(&self) -> &'static [Self] {
        match self {
            SessionState::Opening => &[SessionState::Streaming, SessionState::Closed],
            SessionState::Streaming => &[SessionState::Closed],
            SessionState::Closed => &[],
        }
    }
}

/// Server lifecycle driven only by start/stop/restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl StateMachine for LifecycleState {
    fn valid_transitions(&self) -> &'static [Self] {
        match self {
            LifecycleState::Stopped => &[LifecycleState::Starting],
            // A failed start falls back to Stopped.
            LifecycleState::Starting => &[LifecycleState::Running, LifecycleState::Stopped],
            LifecycleState::Running => &[LifecycleState::Stopping],
            LifecycleState::Stopping => &[LifecycleState::Stopped],
        }
    }

    fn is_terminal(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_happy_path() {
        let state = SessionState::Opening;
        let state = state.transition_to(SessionState::Streaming).unwrap();
        let state = state.transition_to(SessionState::Closed).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn session_can_close_from_opening() {
        assert!(SessionState::Opening.can_transition_to(&SessionState::Closed));
    }

    #[test]
    fn session_cannot_reopen() {
        assert!(SessionState::Closed.transition_to(SessionState::Opening).is_err());
        assert!(SessionState::Streaming.transition_to(SessionState::Opening).is_err());
    }

    #[test]
    fn lifecycle_cycles_through_all_states() {
        let mut state = LifecycleState::Stopped;
        for next in [
            LifecycleState::Starting,
            LifecycleState::Running,
            LifecycleState::Stopping,
            LifecycleState::Stopped,
        ] {
            state = state.transition_to(next).unwrap();
        }
        assert_eq!(state, LifecycleState::Stopped);
        assert!(!state.is_terminal());
    }

    #[test]
    fn lifecycle_rejects_stop_while_stopped() {
        assert!(LifecycleState::Stopped
            .transition_to(LifecycleState::Stopping)
            .is_err());
    }
}
