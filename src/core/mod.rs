//! Core state machine types.
//!
//! This module contains the constant data a machine is defined by:
//! - State and event identity via the `State` and `Event` traits
//! - Transition table entries, including the `Ignored`/`CannotHappen` sentinels
//! - State handlers and optional guard/entry/exit hooks
//!
//! Nothing here mutates; running a machine is the `engine` module's job.

mod hooks;
mod state;
mod transition;

pub use hooks::{EntryFn, ExitFn, GuardFn, MachineType, StateDescriptor, StateFn};
pub use state::{Event, State};
pub use transition::Transition;
