//! State machine trait for lifecycle enums.
//!
//! Streaming sessions and the server lifecycle both move through a small
//! fixed set of states. Implementors list their legal edges once and get a
//! checked `transition_to` for free.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// let next = SessionState::Opening.transition_to(SessionState::Streaming)?;
/// assert!(SessionState::Closed.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + 'static {
    /// Returns all states reachable from `self` in one step.
    fn valid_transitions(&self) -> &'static [Self];

    /// Returns true if `target` is reachable from `self` in one step.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs the transition, rejecting edges that are not declared.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// A state with no outgoing edges.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Off,
    }

    impl StateMachine for Light {
        fn valid_transitions(&self) -> &'static [Self] {
            match self {
                Light::Red => &[Light::Green, Light::Off],
                Light::Green => &[Light::Red, Light::Off],
                Light::Off => &[],
            }
        }
    }

    #[test]
    fn declared_transition_succeeds() {
        assert_eq!(Light::Red.transition_to(Light::Green), Ok(Light::Green));
    }

    #[test]
    fn undeclared_transition_fails() {
        assert!(Light::Off.transition_to(Light::Red).is_err());
    }

    #[test]
    fn terminal_state_has_no_edges() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Red.is_terminal());
    }

    fn walk<S: StateMachine>(start: S, path: &[S]) -> Result<S, ValidationError> {
        path.iter()
            .try_fold(start, |state, next| state.transition_to(*next))
    }

    #[test]
    fn generic_callers_can_drive_any_state_machine() {
        assert_eq!(
            walk(Light::Red, &[Light::Green, Light::Red, Light::Off]),
            Ok(Light::Off)
        );
        assert!(walk(Light::Red, &[Light::Off, Light::Green]).is_err());
    }
}
