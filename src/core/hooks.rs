//! State handlers and the optional guard/entry/exit hooks.
//!
//! Hooks are plain function pointers so a machine's state table is constant
//! data that many instances can share. An absent hook keeps the default
//! behavior: no guard always passes, no entry/exit does nothing.

use super::state::{Event, State};
use crate::engine::MachineInstance;
use std::fmt;

/// Ties together the types one kind of machine is built from.
///
/// Implemented on a marker type; the engine is generic over it.
pub trait MachineType: Sized + 'static {
    /// The machine's state set.
    type State: State;

    /// The external events the machine accepts.
    type Event: Event;

    /// The owning domain object the handlers act on.
    type Object;

    /// Event payload passed to handlers.
    type Data;
}

/// Runs the steady-state logic of a state. May request one internal transition.
pub type StateFn<M> = fn(&mut MachineInstance<M>, Option<&<M as MachineType>::Data>);

/// Decides whether a transition into its state may proceed.
pub type GuardFn<M> = fn(&MachineInstance<M>, Option<&<M as MachineType>::Data>) -> bool;

/// Runs when the state is entered from a different state.
pub type EntryFn<M> = fn(&mut MachineInstance<M>, Option<&<M as MachineType>::Data>);

/// Runs when the state is left for a different state.
pub type ExitFn<M> = fn(&mut MachineInstance<M>);

/// Constant record describing one state.
pub struct StateDescriptor<M: MachineType> {
    pub state: M::State,
    pub handler: StateFn<M>,
    pub guard: Option<GuardFn<M>>,
    pub entry: Option<EntryFn<M>>,
    pub exit: Option<ExitFn<M>>,
}

impl<M: MachineType> StateDescriptor<M> {
    /// Describe a state with only a handler.
    pub fn new(state: M::State, handler: StateFn<M>) -> Self {
        Self {
            state,
            handler,
            guard: None,
            entry: None,
            exit: None,
        }
    }

    pub fn with_guard(mut self, guard: GuardFn<M>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_entry(mut self, entry: EntryFn<M>) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_exit(mut self, exit: ExitFn<M>) -> Self {
        self.exit = Some(exit);
        self
    }

    /// True if any of guard, entry or exit is set.
    pub fn has_hooks(&self) -> bool {
        self.guard.is_some() || self.entry.is_some() || self.exit.is_some()
    }
}

// Manual impls: deriving would demand `M: Clone`.
impl<M: MachineType> Clone for StateDescriptor<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: MachineType> Copy for StateDescriptor<M> {}

impl<M: MachineType> fmt::Debug for StateDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDescriptor")
            .field("state", &self.state)
            .field("guard", &self.guard.is_some())
            .field("entry", &self.entry.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}
