//! State and event identity traits.
//!
//! A machine's states and events are small closed sets. Each member maps to a
//! dense index, and the index is what the engine uses to look up state
//! descriptors and transition table rows.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// The id of a state is its row in the machine's state table, so ids must be
/// dense, start at zero and stay below [`State::COUNT`]. States are usually
/// generated with [`state_enum!`](crate::state_enum).
///
/// # Example
///
/// ```rust
/// use fsmpool::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Valve {
///     Closed,
///     Open,
/// }
///
/// impl State for Valve {
///     const COUNT: usize = 2;
///
///     fn id(&self) -> usize {
///         *self as usize
///     }
///
///     fn from_id(id: usize) -> Option<Self> {
///         match id {
///             0 => Some(Self::Closed),
///             1 => Some(Self::Open),
///             _ => None,
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Closed => "Closed",
///             Self::Open => "Open",
///         }
///     }
/// }
///
/// assert_eq!(Valve::from_id(Valve::Open.id()), Some(Valve::Open));
/// ```
pub trait State:
    Copy + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Number of states in the set.
    const COUNT: usize;

    /// Dense index of this state.
    fn id(&self) -> usize;

    /// Inverse of [`State::id`].
    fn from_id(id: usize) -> Option<Self>;

    /// Get the state's name for display/logging.
    fn name(&self) -> &'static str;
}

/// Trait for the external events a machine accepts.
///
/// Every event owns exactly one transition table; the id selects it.
pub trait Event: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Number of events in the set.
    const COUNT: usize;

    /// Dense index of this event.
    fn id(&self) -> usize;

    /// Inverse of [`Event::id`].
    fn from_id(id: usize) -> Option<Self>;

    /// Get the event's name for display/logging.
    fn name(&self) -> &'static str;
}
