//! Transition table entries.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of a transition table: what an event does in one current state.
///
/// A transition table holds one entry per state, in state id order.
///
/// # Example
///
/// ```rust
/// use fsmpool::core::Transition;
/// use fsmpool::state_enum;
///
/// state_enum! {
///     enum Door {
///         Closed,
///         Open,
///         Jammed,
///     }
/// }
///
/// // The "push" event, indexed by current state.
/// let push = [
///     Transition::To(Door::Open),   // Closed
///     Transition::Ignored,          // Open
///     Transition::CannotHappen,     // Jammed
/// ];
/// assert_eq!(push[0].target(), Some(Door::Open));
/// assert!(push[1].is_ignored());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Transition<S: State> {
    /// Move to the given state.
    To(S),

    /// The event has no effect in this state. Any payload is released.
    Ignored,

    /// The event must never arrive in this state. Reaching it is a fault.
    CannotHappen,
}

impl<S: State> Transition<S> {
    /// Target state, if this entry names one.
    pub fn target(&self) -> Option<S> {
        match self {
            Self::To(state) => Some(*state),
            Self::Ignored | Self::CannotHappen => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn cannot_happen(&self) -> bool {
        matches!(self, Self::CannotHappen)
    }
}

impl<S: State> From<S> for Transition<S> {
    fn from(state: S) -> Self {
        Self::To(state)
    }
}

impl<S: State> fmt::Display for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(state) => f.write_str(state.name()),
            Self::Ignored => f.write_str("IGNORED"),
            Self::CannotHappen => f.write_str("CANNOT_HAPPEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_enum;

    state_enum! {
        enum TestState {
            Start,
            End,
        }
    }

    #[test]
    fn target_only_for_concrete_entries() {
        assert_eq!(Transition::To(TestState::End).target(), Some(TestState::End));
        assert_eq!(Transition::<TestState>::Ignored.target(), None);
        assert_eq!(Transition::<TestState>::CannotHappen.target(), None);
    }

    #[test]
    fn state_converts_into_transition() {
        let transition: Transition<TestState> = TestState::Start.into();
        assert_eq!(transition, Transition::To(TestState::Start));
    }

    #[test]
    fn display_uses_state_names_and_sentinels() {
        assert_eq!(Transition::To(TestState::End).to_string(), "End");
        assert_eq!(Transition::<TestState>::Ignored.to_string(), "IGNORED");
        assert_eq!(
            Transition::<TestState>::CannotHappen.to_string(),
            "CANNOT_HAPPEN"
        );
    }
}
