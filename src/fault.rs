//! Contract violations.
//!
//! A [`Fault`] means the static configuration or the caller's discipline is
//! broken: an exhausted pool, a payload larger than every size class, a
//! transition table naming an impossible move. Nothing in this crate tries to
//! recover from one. Faults are returned rather than aborting on the spot so
//! callers and tests can observe them; callers that want the classic
//! "assert and halt" behavior call [`Fault::halt`].
//!
//! Every fault records the source location of the check that detected it and
//! is logged at `error` level the moment it is raised.

use std::panic::Location;
use thiserror::Error;

/// What contract was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("Machine '{machine}': state id {state} outside 0..{max}")]
    StateOutOfRange {
        machine: String,
        state: usize,
        max: usize,
    },

    #[error("Machine '{machine}': event '{event}' cannot happen in state '{state}'")]
    CannotHappen {
        machine: String,
        event: String,
        state: String,
    },

    #[error("Machine '{machine}': event id {event} has no transition table")]
    UnknownEvent { machine: String, event: usize },

    #[error("Machine '{machine}': entry/exit action of '{state}' requested a transition")]
    TransitionFromAction { machine: String, state: String },

    #[error("Pool '{pool}' exhausted: all {capacity} blocks in use")]
    PoolExhausted { pool: String, capacity: usize },

    #[error("Pool '{pool}': request of {requested} bytes exceeds block size {block_size}")]
    RequestTooLarge {
        pool: String,
        requested: usize,
        block_size: usize,
    },

    #[error("No size class holds {requested} bytes (largest capacity is {largest})")]
    NoSizeClass { requested: usize, largest: usize },

    #[error("Allocation size overflows usize")]
    SizeOverflow,

    #[error("Payload alignment {align} exceeds block alignment {supported}")]
    UnsupportedAlignment { align: usize, supported: usize },
}

/// A contract violation together with where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Fault at {}:{}: {kind}", .location.file(), .location.line())]
pub struct Fault {
    kind: FaultKind,
    location: &'static Location<'static>,
}

impl Fault {
    /// Record a violation at the caller's location and log it.
    #[track_caller]
    pub fn raise(kind: FaultKind) -> Self {
        let location = Location::caller();
        tracing::error!(
            file = location.file(),
            line = location.line(),
            fault = %kind,
            "contract violation"
        );
        Self { kind, location }
    }

    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }

    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// Stop the program. Use where a violation must never be survived.
    pub fn halt(self) -> ! {
        panic!("{self}")
    }
}

/// Result of an operation that can only fail by contract violation.
pub type FaultResult<T> = Result<T, Fault>;
