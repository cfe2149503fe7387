//! Constant per-machine data.

use crate::core::{Event, MachineType, State, StateDescriptor, Transition};
use crate::fault::{Fault, FaultKind, FaultResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which drain loop a machine runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    /// State handlers only.
    Basic,

    /// State handlers plus guard, entry and exit hooks.
    Extended,
}

/// State table and transition tables of one kind of machine.
///
/// Built and validated by [`MachineBuilder`](crate::builder::MachineBuilder);
/// shared read-only by every instance of the machine.
pub struct MachineDescriptor<M: MachineType> {
    name: String,
    kind: EngineKind,
    states: Box<[StateDescriptor<M>]>,
    tables: Box<[Box<[Transition<M::State>]>]>,
    initial: M::State,
}

impl<M: MachineType> MachineDescriptor<M> {
    /// Assemble a descriptor from already validated parts.
    ///
    /// `states` is indexed by state id and `tables` by event id.
    pub(crate) fn from_parts(
        name: String,
        kind: EngineKind,
        states: Vec<StateDescriptor<M>>,
        tables: Vec<Box<[Transition<M::State>]>>,
        initial: M::State,
    ) -> Self {
        Self {
            name,
            kind,
            states: states.into_boxed_slice(),
            tables: tables.into_boxed_slice(),
            initial,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// State new instances start in.
    pub fn initial_state(&self) -> M::State {
        self.initial
    }

    /// State descriptors in id order.
    pub fn states(&self) -> &[StateDescriptor<M>] {
        &self.states
    }

    /// Descriptor for `state`, faulting if its id is outside the state table.
    #[track_caller]
    pub fn state(&self, state: M::State) -> FaultResult<&StateDescriptor<M>> {
        self.states.get(state.id()).ok_or_else(|| {
            Fault::raise(FaultKind::StateOutOfRange {
                machine: self.name.clone(),
                state: state.id(),
                max: self.states.len(),
            })
        })
    }

    /// Transition table of `event`, one entry per state.
    pub fn table(&self, event: M::Event) -> Option<&[Transition<M::State>]> {
        self.tables.get(event.id()).map(|table| &**table)
    }

    /// Look up what `event` does in `current`.
    #[track_caller]
    pub fn transition(
        &self,
        event: M::Event,
        current: M::State,
    ) -> FaultResult<Transition<M::State>> {
        let Some(table) = self.table(event) else {
            return Err(Fault::raise(FaultKind::UnknownEvent {
                machine: self.name.clone(),
                event: event.id(),
            }));
        };

        table.get(current.id()).copied().ok_or_else(|| {
            Fault::raise(FaultKind::StateOutOfRange {
                machine: self.name.clone(),
                state: current.id(),
                max: table.len(),
            })
        })
    }
}

impl<M: MachineType> fmt::Debug for MachineDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("states", &self.states)
            .field("tables", &self.tables)
            .field("initial", &self.initial)
            .finish()
    }
}
