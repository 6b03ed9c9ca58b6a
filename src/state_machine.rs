// Copyright 2025 Cowboy AI, LLC.

//! State machine traits for entity lifecycles
//!
//! Lifecycles are modelled as Moore-style machines: each status enum lists
//! which target states it may move to, and [`guard_transition`] turns a
//! refused move into a [`DomainError::InvalidStateTransition`] carrying a
//! human-readable reason.
//!
//! Both [`CommandStatus`](crate::CommandStatus) and
//! [`SessionStatus`](crate::SessionStatus) implement these traits.

use crate::errors::{DomainError, DomainResult};
use std::fmt::Debug;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging and error messages
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Transition table for a state type
///
/// # Examples
///
/// ```rust
/// use cim_cli::state_machine::{State, StateTransitions};
/// use cim_cli::CommandStatus;
///
/// assert!(CommandStatus::Pending.can_transition_to(&CommandStatus::Running));
/// assert!(!CommandStatus::Pending.can_transition_to(&CommandStatus::Completed));
/// assert!(CommandStatus::Failed.valid_transitions().is_empty());
/// ```
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;
}

/// Refuse a transition the table does not allow
///
/// `reason` is the message a caller sees, e.g. "command must be pending to
/// start".
pub fn guard_transition<S: StateTransitions>(
    from: &S,
    to: &S,
    reason: impl Into<String>,
) -> DomainResult<()> {
    if from.is_terminal() || !from.can_transition_to(to) {
        return Err(DomainError::InvalidStateTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
            reason: reason.into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Off,
    }

    impl State for Light {
        fn name(&self) -> &'static str {
            match self {
                Light::Red => "red",
                Light::Green => "green",
                Light::Off => "off",
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self, Light::Off)
        }
    }

    impl StateTransitions for Light {
        fn can_transition_to(&self, target: &Self) -> bool {
            matches!(
                (self, target),
                (Light::Red, Light::Green) | (Light::Green, Light::Red) | (_, Light::Off)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Red => vec![Light::Green, Light::Off],
                Light::Green => vec![Light::Red, Light::Off],
                Light::Off => vec![],
            }
        }
    }

    #[test]
    fn test_guard_allows_listed_transition() {
        assert!(guard_transition(&Light::Red, &Light::Green, "unused").is_ok());
    }

    #[test]
    fn test_guard_refuses_with_reason() {
        let err = guard_transition(&Light::Red, &Light::Red, "light is already red").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "red".to_string(),
                to: "red".to_string(),
                reason: "light is already red".to_string(),
            }
        );
    }

    /// Terminal states refuse everything, even when the table is permissive
    #[test]
    fn test_guard_refuses_from_terminal() {
        assert!(guard_transition(&Light::Off, &Light::Off, "light is off").is_err());
    }
}
