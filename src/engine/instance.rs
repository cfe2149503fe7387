//! Running machine instances.

use super::descriptor::MachineDescriptor;
use crate::core::{MachineType, State};
use crate::memory::Payload;
use std::fmt;
use std::sync::Arc;

/// A requested transition waiting for the drain loop.
pub(crate) struct Pending<M: MachineType> {
    pub(crate) target: M::State,
    pub(crate) data: Option<Payload<M::Data>>,
}

/// One running machine: its current state, its pending transition and the
/// domain object its handlers act on.
///
/// Several instances may share one [`MachineDescriptor`]. The instance is
/// driven through `&mut self`, so one instance is never dispatched from two
/// places at once.
pub struct MachineInstance<M: MachineType> {
    name: String,
    descriptor: Arc<MachineDescriptor<M>>,
    object: M::Object,
    pub(crate) current_state: M::State,
    pub(crate) pending: Option<Pending<M>>,
}

impl<M: MachineType> MachineInstance<M> {
    /// Create an instance in the descriptor's initial state.
    pub fn new(
        name: impl Into<String>,
        descriptor: Arc<MachineDescriptor<M>>,
        object: M::Object,
    ) -> Self {
        let current_state = descriptor.initial_state();
        Self {
            name: name.into(),
            descriptor,
            object,
            current_state,
            pending: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<MachineDescriptor<M>> {
        &self.descriptor
    }

    pub fn current_state(&self) -> M::State {
        self.current_state
    }

    /// Read a value from the domain object. Never touches engine state.
    pub fn get<R>(&self, accessor: impl FnOnce(&M::Object) -> R) -> R {
        accessor(&self.object)
    }

    pub fn object(&self) -> &M::Object {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut M::Object {
        &mut self.object
    }

    /// Give the domain object back, discarding the instance.
    pub fn into_object(self) -> M::Object {
        self.object
    }

    /// Request a transition to `target` from inside a handler.
    ///
    /// The drain loop performs it once the current handler returns. A second
    /// request from the same handler replaces the first and releases its data.
    pub fn internal_event(&mut self, target: M::State, data: Option<Payload<M::Data>>) {
        tracing::trace!(
            machine = %self.name,
            target = target.name(),
            "internal event requested"
        );
        self.pending = Some(Pending { target, data });
    }

    pub fn is_transition_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<M: MachineType> fmt::Debug for MachineInstance<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineInstance")
            .field("name", &self.name)
            .field("machine", &self.descriptor.name())
            .field("current_state", &self.current_state)
            .field(
                "pending_state",
                &self.pending.as_ref().map(|pending| pending.target),
            )
            .finish()
    }
}
