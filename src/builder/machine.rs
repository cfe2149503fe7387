//! Builder for machine descriptors.

use crate::builder::error::BuildError;
use crate::core::{Event, MachineType, State, StateDescriptor, Transition};
use crate::engine::{EngineKind, MachineDescriptor};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for [`MachineDescriptor`] with a fluent API.
///
/// States are registered in id order and every event gets one transition
/// table with one entry per state. [`validate`](Self::validate) reports every
/// problem at once; [`build`](Self::build) refuses to produce a descriptor
/// unless validation passes.
pub struct MachineBuilder<M: MachineType> {
    name: String,
    kind: EngineKind,
    initial: Option<M::State>,
    states: Vec<StateDescriptor<M>>,
    events: Vec<(M::Event, Vec<Transition<M::State>>)>,
}

impl<M: MachineType> MachineBuilder<M> {
    pub fn new(name: impl Into<String>, kind: EngineKind) -> Self {
        Self {
            name: name.into(),
            kind,
            initial: None,
            states: Vec::new(),
            events: Vec::new(),
        }
    }

    /// A machine whose states have handlers only.
    pub fn basic(name: impl Into<String>) -> Self {
        Self::new(name, EngineKind::Basic)
    }

    /// A machine whose states may carry guard, entry and exit hooks.
    pub fn extended(name: impl Into<String>) -> Self {
        Self::new(name, EngineKind::Extended)
    }

    /// Register the next state. Order must follow state ids.
    pub fn state(mut self, descriptor: StateDescriptor<M>) -> Self {
        self.states.push(descriptor);
        self
    }

    /// Register several states at once.
    pub fn states(mut self, descriptors: impl IntoIterator<Item = StateDescriptor<M>>) -> Self {
        self.states.extend(descriptors);
        self
    }

    /// State new instances start in. Defaults to the first registered state.
    pub fn initial(mut self, state: M::State) -> Self {
        self.initial = Some(state);
        self
    }

    /// Transition table for `event`, indexed by current state id.
    pub fn event(
        mut self,
        event: M::Event,
        table: impl IntoIterator<Item = Transition<M::State>>,
    ) -> Self {
        self.events.push((event, table.into_iter().collect()));
        self
    }

    /// Check the definition, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<BuildError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = Vec::new();

        checks.push(self.check_states());
        checks.extend(self.initial.map(Self::check_initial));
        checks.extend(self.states.iter().enumerate().map(|(index, descriptor)| {
            let id = descriptor.state.id();
            if id != index {
                Validation::fail(BuildError::StateOutOfOrder {
                    state: descriptor.state.name().to_string(),
                    index,
                    id,
                })
            } else if self.kind == EngineKind::Basic && descriptor.has_hooks() {
                Validation::fail(BuildError::HooksOnBasicMachine {
                    state: descriptor.state.name().to_string(),
                })
            } else {
                Validation::success(())
            }
        }));
        checks.extend((0..M::Event::COUNT).map(|id| self.check_event_registered(id)));
        checks.extend(
            self.events
                .iter()
                .map(|(event, table)| Self::check_table(*event, table)),
        );

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the descriptor.
    /// Returns [`BuildError::Invalid`] listing every violation found.
    pub fn build(self) -> Result<MachineDescriptor<M>, BuildError> {
        if let Validation::Failure(errors) = self.validate() {
            let violations: Vec<BuildError> = errors.iter().cloned().collect();
            tracing::warn!(
                machine = %self.name,
                violations = violations.len(),
                "machine definition rejected"
            );
            return Err(BuildError::Invalid {
                machine: self.name,
                violations,
            });
        }

        let initial = self
            .initial
            .or_else(|| self.states.first().map(|descriptor| descriptor.state))
            .ok_or(BuildError::NoStates)?;

        let mut events = self.events;
        events.sort_by_key(|(event, _)| event.id());
        let tables = events
            .into_iter()
            .map(|(_, table)| table.into_boxed_slice())
            .collect();

        tracing::debug!(
            machine = %self.name,
            kind = ?self.kind,
            states = self.states.len(),
            "machine descriptor built"
        );

        Ok(MachineDescriptor::from_parts(
            self.name,
            self.kind,
            self.states,
            tables,
            initial,
        ))
    }

    fn check_states(&self) -> Validation<(), NonEmptyVec<BuildError>> {
        if self.states.is_empty() {
            Validation::fail(BuildError::NoStates)
        } else if self.states.len() != M::State::COUNT {
            Validation::fail(BuildError::StateCountMismatch {
                expected: M::State::COUNT,
                found: self.states.len(),
            })
        } else {
            Validation::success(())
        }
    }

    fn check_initial(initial: M::State) -> Validation<(), NonEmptyVec<BuildError>> {
        if initial.id() < M::State::COUNT {
            Validation::success(())
        } else {
            Validation::fail(BuildError::InitialOutOfRange {
                state: initial.name().to_string(),
                id: initial.id(),
                max: M::State::COUNT,
            })
        }
    }

    fn check_event_registered(&self, id: usize) -> Validation<(), NonEmptyVec<BuildError>> {
        let event = M::Event::from_id(id).map_or_else(|| id.to_string(), |e| e.name().to_string());

        match self.events.iter().filter(|(e, _)| e.id() == id).count() {
            0 => Validation::fail(BuildError::MissingEvent { event }),
            1 => Validation::success(()),
            _ => Validation::fail(BuildError::DuplicateEvent { event }),
        }
    }

    fn check_table(
        event: M::Event,
        table: &[Transition<M::State>],
    ) -> Validation<(), NonEmptyVec<BuildError>> {
        let expected = M::State::COUNT;
        if table.len() != expected {
            return Validation::fail(BuildError::TableLength {
                event: event.name().to_string(),
                expected,
                found: table.len(),
            });
        }

        let checks: Vec<Validation<(), NonEmptyVec<BuildError>>> = table
            .iter()
            .enumerate()
            .map(|(from, entry)| match entry {
                Transition::To(target) if target.id() >= expected => {
                    Validation::fail(BuildError::TargetOutOfRange {
                        event: event.name().to_string(),
                        from: M::State::from_id(from)
                            .map_or_else(|| from.to_string(), |s| s.name().to_string()),
                        target: target.id(),
                        max: expected,
                    })
                }
                _ => Validation::success(()),
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }
}
