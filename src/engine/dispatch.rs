//! Event resolution and the drain loops.
//!
//! An external event is looked up in its transition table, recorded as the
//! pending transition and then drained: each pass takes the pending target,
//! makes it current and runs its handler. A handler that calls
//! [`MachineInstance::internal_event`] keeps the loop going; one that does not
//! ends it. There is no cycle detection, a handler that always re-requests
//! loops forever.
//!
//! The extended loop adds three hooks per pass, in this order:
//!
//! ```text
//!  guard(target) ── false ──> stop, state unchanged, payload released
//!       │ true
//!       ▼
//!  exit(current) ─> entry(target)     (skipped when target == current)
//!       ▼
//!  current = target ─> handler(target, payload) ─> release payload
//! ```

use super::descriptor::EngineKind;
use super::instance::{MachineInstance, Pending};
use crate::core::{Event, MachineType, State, Transition};
use crate::fault::{Fault, FaultKind, FaultResult};
use crate::memory::Payload;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one external event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dispatch {
    /// The table entry was `Ignored`; no handler ran.
    Ignored,

    /// A guard rejected a transition after `steps` handlers had run.
    Vetoed { steps: usize },

    /// The drain loop ran `steps` handlers and no transition is pending.
    Completed { steps: usize },
}

impl Dispatch {
    /// Number of state handlers that ran.
    pub fn steps(&self) -> usize {
        match self {
            Self::Ignored => 0,
            Self::Vetoed { steps } | Self::Completed { steps } => *steps,
        }
    }
}

impl<M: MachineType> MachineInstance<M> {
    /// Deliver `event` with optional payload.
    ///
    /// Ownership of `data` moves to the engine; it is released after the
    /// handler that consumes it returns, or straight away if the event is
    /// ignored or vetoed.
    pub fn dispatch(
        &mut self,
        event: M::Event,
        data: Option<Payload<M::Data>>,
    ) -> FaultResult<Dispatch> {
        let transition = self.descriptor().transition(event, self.current_state)?;
        self.resolve(event.name(), transition, data)
    }

    /// Deliver an already resolved transition table entry.
    pub fn external_event(
        &mut self,
        transition: Transition<M::State>,
        data: Option<Payload<M::Data>>,
    ) -> FaultResult<Dispatch> {
        self.resolve("external", transition, data)
    }

    fn resolve(
        &mut self,
        event: &str,
        transition: Transition<M::State>,
        data: Option<Payload<M::Data>>,
    ) -> FaultResult<Dispatch> {
        let target = match transition {
            Transition::To(target) => target,
            Transition::Ignored => {
                tracing::debug!(
                    machine = %self.name(),
                    event,
                    state = self.current_state.name(),
                    "event ignored"
                );
                return Ok(Dispatch::Ignored);
            }
            Transition::CannotHappen => {
                return Err(Fault::raise(FaultKind::CannotHappen {
                    machine: self.descriptor().name().to_string(),
                    event: event.to_string(),
                    state: self.current_state.name().to_string(),
                }));
            }
        };

        tracing::debug!(
            machine = %self.name(),
            event,
            from = self.current_state.name(),
            to = target.name(),
            "external event"
        );
        self.pending = Some(Pending { target, data });

        match self.descriptor().kind() {
            EngineKind::Basic => self.drain_basic(),
            EngineKind::Extended => self.drain_extended(),
        }
    }

    fn drain_basic(&mut self) -> FaultResult<Dispatch> {
        let descriptor = Arc::clone(self.descriptor());
        let mut steps = 0;

        while let Some(Pending { target, data }) = self.pending.take() {
            let state = descriptor.state(target)?;

            self.enter(target);
            (state.handler)(self, data.as_deref());
            steps += 1;
        }

        Ok(Dispatch::Completed { steps })
    }

    fn drain_extended(&mut self) -> FaultResult<Dispatch> {
        let descriptor = Arc::clone(self.descriptor());
        let mut steps = 0;

        while let Some(Pending { target, data }) = self.pending.take() {
            let next = descriptor.state(target)?;
            let current = descriptor.state(self.current_state)?;
            let payload = data.as_deref();

            if let Some(guard) = next.guard {
                if !guard(self, payload) {
                    tracing::debug!(
                        machine = %self.name(),
                        state = self.current_state.name(),
                        target = target.name(),
                        "transition vetoed by guard"
                    );
                    return Ok(Dispatch::Vetoed { steps });
                }
            }

            if target != self.current_state {
                if let Some(exit) = current.exit {
                    exit(self);
                    self.forbid_pending(current.state)?;
                }
                if let Some(entry) = next.entry {
                    entry(self, payload);
                    self.forbid_pending(target)?;
                }
            }

            self.enter(target);
            (next.handler)(self, payload);
            steps += 1;
        }

        Ok(Dispatch::Completed { steps })
    }

    fn enter(&mut self, target: M::State) {
        tracing::debug!(
            machine = %self.name(),
            from = self.current_state.name(),
            to = target.name(),
            "state transition"
        );
        self.current_state = target;
    }

    /// Entry and exit actions must not request transitions.
    fn forbid_pending(&mut self, state: M::State) -> FaultResult<()> {
        if self.pending.take().is_some() {
            return Err(Fault::raise(FaultKind::TransitionFromAction {
                machine: self.descriptor().name().to_string(),
                state: state.name().to_string(),
            }));
        }
        Ok(())
    }
}
