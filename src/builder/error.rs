//! Build errors for machine descriptors.

use thiserror::Error;

/// Problems found while validating a machine definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No states registered. Call .state(..) before .build()")]
    NoStates,

    #[error("{found} states registered but the state set has {expected}")]
    StateCountMismatch { expected: usize, found: usize },

    #[error("State '{state}' registered at index {index} but its id is {id}")]
    StateOutOfOrder {
        state: String,
        index: usize,
        id: usize,
    },

    #[error("No transition table for event '{event}'")]
    MissingEvent { event: String },

    #[error("Event '{event}' has more than one transition table")]
    DuplicateEvent { event: String },

    #[error("Event '{event}' table has {found} entries, expected one per state ({expected})")]
    TableLength {
        event: String,
        expected: usize,
        found: usize,
    },

    #[error("Event '{event}' in state '{from}' targets state id {target}, outside 0..{max}")]
    TargetOutOfRange {
        event: String,
        from: String,
        target: usize,
        max: usize,
    },

    #[error("Initial state '{state}' has id {id}, outside 0..{max}")]
    InitialOutOfRange {
        state: String,
        id: usize,
        max: usize,
    },

    #[error("State '{state}' declares guard/entry/exit hooks on a basic machine")]
    HooksOnBasicMachine { state: String },

    #[error("Machine '{machine}' rejected with {} violation(s)", .violations.len())]
    Invalid {
        machine: String,
        violations: Vec<BuildError>,
    },
}
