//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while taking, encoding or restoring snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot version is not supported by this version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Snapshot was taken from a different kind of machine
    #[error("Snapshot of machine '{found}' cannot restore machine '{expected}'")]
    MachineMismatch { expected: String, found: String },

    /// Snapshot names a state the machine does not have
    #[error("Machine '{machine}' has no state with id {state}")]
    UnknownState { machine: String, state: usize },

    /// Instance is in the middle of a dispatch
    #[error("Machine instance '{instance}' has a transition pending")]
    TransitionPending { instance: String },
}
