//! Snapshots of machine instances and allocator usage.
//!
//! A [`MachineSnapshot`] records which state an instance is in so it can be
//! persisted and later restored into a fresh instance of the same machine.
//! Handlers, the domain object and payloads are not part of it. Restoring
//! sets the current state directly; no guard, entry, exit or state handler
//! runs.
//!
//! A [`UsageReport`] captures the counters of every pool of a size-class
//! allocator for diagnostics.

use crate::core::{MachineType, State};
use crate::engine::MachineInstance;
use crate::memory::{PoolStats, SizeClassAllocator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable record of an instance's position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineSnapshot<S: State> {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Name of the machine descriptor
    pub machine: String,

    /// Name of the instance
    pub instance: String,

    pub current_state: S,
}

impl<S: State> MachineSnapshot<S> {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    /// Parse a JSON snapshot, rejecting unknown format versions.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

impl<M: MachineType> MachineInstance<M> {
    /// Record the current state.
    ///
    /// Fails while a transition is pending, which can only be observed from
    /// inside a handler.
    pub fn snapshot(&self) -> Result<MachineSnapshot<M::State>, SnapshotError> {
        if self.is_transition_pending() {
            return Err(SnapshotError::TransitionPending {
                instance: self.name().to_string(),
            });
        }

        Ok(MachineSnapshot {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            machine: self.descriptor().name().to_string(),
            instance: self.name().to_string(),
            current_state: self.current_state(),
        })
    }

    /// Move to the snapshot's state without running any handler.
    pub fn restore(&mut self, snapshot: &MachineSnapshot<M::State>) -> Result<(), SnapshotError> {
        snapshot.check_version()?;

        let machine = self.descriptor().name();
        if snapshot.machine != machine {
            return Err(SnapshotError::MachineMismatch {
                expected: machine.to_string(),
                found: snapshot.machine.clone(),
            });
        }

        let state = snapshot.current_state.id();
        if state >= self.descriptor().state_count() {
            return Err(SnapshotError::UnknownState {
                machine: machine.to_string(),
                state,
            });
        }

        tracing::debug!(
            machine = %machine,
            instance = %self.name(),
            snapshot = %snapshot.id,
            state = snapshot.current_state.name(),
            "instance restored"
        );
        self.current_state = snapshot.current_state;
        self.pending = None;
        Ok(())
    }
}

/// Point-in-time usage of every pool of an allocator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub pools: Vec<PoolStats>,
}

impl UsageReport {
    pub fn capture(allocator: &SizeClassAllocator) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            pools: allocator.stats(),
        }
    }

    /// Live blocks across all pools.
    pub fn blocks_in_use(&self) -> usize {
        self.pools.iter().map(|pool| pool.blocks_in_use).sum()
    }

    /// Pools whose high-water mark reached their capacity.
    pub fn saturated(&self) -> impl Iterator<Item = &PoolStats> {
        self.pools
            .iter()
            .filter(|pool| pool.max_blocks_in_use >= pool.capacity)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;
    use crate::core::{StateDescriptor, Transition};
    use crate::memory::{AllocatorConfig, EventPayloadAllocator};
    use crate::{event_enum, state_enum};
    use std::sync::Arc;

    state_enum! {
        enum Job {
            Queued,
            Running,
            Done,
        }
    }

    event_enum! {
        enum JobEvent {
            Advance,
        }
    }

    struct JobMachine;

    impl MachineType for JobMachine {
        type State = Job;
        type Event = JobEvent;
        type Object = Vec<Job>;
        type Data = ();
    }

    fn st_record(sm: &mut MachineInstance<JobMachine>, _: Option<&()>) {
        let state = sm.current_state();
        sm.object_mut().push(state);
    }

    fn job(name: &str) -> MachineInstance<JobMachine> {
        let descriptor = MachineBuilder::basic(name)
            .state(StateDescriptor::new(Job::Queued, st_record))
            .state(StateDescriptor::new(Job::Running, st_record))
            .state(StateDescriptor::new(Job::Done, st_record))
            .event(
                JobEvent::Advance,
                [
                    Transition::To(Job::Running),
                    Transition::To(Job::Done),
                    Transition::Ignored,
                ],
            )
            .build()
            .unwrap();
        MachineInstance::new("job1", Arc::new(descriptor), Vec::new())
    }

    #[test]
    fn snapshot_records_position() {
        let mut sm = job("Job");
        sm.dispatch(JobEvent::Advance, None).unwrap();

        let snapshot = sm.snapshot().unwrap();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.machine, "Job");
        assert_eq!(snapshot.instance, "job1");
        assert_eq!(snapshot.current_state, Job::Running);
    }

    #[test]
    fn json_encoding_round_trips() {
        let snapshot = job("Job").snapshot().unwrap();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"current_state\":\"Queued\""));

        let decoded = MachineSnapshot::<Job>::from_json(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn binary_encoding_round_trips() {
        let snapshot = job("Job").snapshot().unwrap();
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = MachineSnapshot::<Job>::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = job("Job").snapshot().unwrap();
        snapshot.version = 99;
        let json = snapshot.to_json().unwrap();

        let result = MachineSnapshot::<Job>::from_json(&json);
        assert!(matches!(
            result,
            Err(SnapshotError::UnsupportedVersion {
                found: 99,
                supported: SNAPSHOT_VERSION
            })
        ));
    }

    #[test]
    fn malformed_input_is_a_deserialization_error() {
        let result = MachineSnapshot::<Job>::from_json("{ not json");
        assert!(matches!(
            result,
            Err(SnapshotError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn restore_sets_state_without_running_handlers() {
        let mut source = job("Job");
        source.dispatch(JobEvent::Advance, None).unwrap();
        source.dispatch(JobEvent::Advance, None).unwrap();
        let snapshot = source.snapshot().unwrap();

        let mut target = job("Job");
        target.restore(&snapshot).unwrap();

        assert_eq!(target.current_state(), Job::Done);
        assert!(target.object().is_empty());
        assert_eq!(
            target.dispatch(JobEvent::Advance, None).unwrap(),
            crate::engine::Dispatch::Ignored
        );
    }

    #[test]
    fn restore_rejects_other_machines() {
        let snapshot = job("Job").snapshot().unwrap();
        let mut other = job("OtherJob");

        let result = other.restore(&snapshot);
        assert!(matches!(
            result,
            Err(SnapshotError::MachineMismatch { .. })
        ));
        assert_eq!(other.current_state(), Job::Queued);
    }

    #[test]
    fn usage_report_captures_every_pool() {
        let payloads = EventPayloadAllocator::with_config(
            &AllocatorConfig::default()
                .class("small", 16, 2)
                .class("large", 64, 1),
        )
        .unwrap();
        let _a = payloads.payload(1u8).unwrap();
        let _b = payloads.payload(2u8).unwrap();

        let report = UsageReport::capture(payloads.allocator());

        assert_eq!(report.pools.len(), 2);
        assert_eq!(report.blocks_in_use(), 2);
        let saturated: Vec<_> = report.saturated().map(|p| p.name.as_str()).collect();
        assert_eq!(saturated, vec!["small"]);
        assert!(report.to_json().unwrap().contains("\"max_blocks_in_use\": 2"));
    }
}
