//! Fsmpool: table-driven state machines on deterministic payload pools
//!
//! Fsmpool pairs two primitives for firmware-style control logic. The state
//! machine engine resolves events through constant transition tables and
//! drains chained internal transitions. The memory subsystem serves the
//! engine's event payloads from fixed-block pools that are reserved once and
//! never grow.
//!
//! # Core Concepts
//!
//! - **State / Event**: dense, typed id sets, usually declared with
//!   [`state_enum!`] and [`event_enum!`]
//! - **Transition tables**: one entry per state for every event, each a
//!   target state, `Ignored` or `CannotHappen`
//! - **Descriptors and instances**: a validated [`MachineDescriptor`] is
//!   shared by any number of [`MachineInstance`]s
//! - **Payloads**: event data lives in an [`EventPayloadAllocator`] block and
//!   is released by the engine once its handler returns
//! - **Faults**: contract violations are returned as [`Fault`] and can be
//!   turned into a hard stop with [`Fault::halt`]
//!
//! # Example
//!
//! ```rust
//! use fsmpool::{
//!     event_enum, state_enum, EventPayloadAllocator, MachineBuilder, MachineInstance,
//!     MachineType, StateDescriptor, Transition,
//! };
//! use std::sync::Arc;
//!
//! state_enum! {
//!     enum Heater {
//!         Off,
//!         Heating,
//!     }
//! }
//!
//! event_enum! {
//!     enum HeaterEvent {
//!         SetTarget,
//!         Shutdown,
//!     }
//! }
//!
//! struct HeaterMachine;
//!
//! impl MachineType for HeaterMachine {
//!     type State = Heater;
//!     type Event = HeaterEvent;
//!     type Object = i32;
//!     type Data = i32;
//! }
//!
//! fn st_off(sm: &mut MachineInstance<HeaterMachine>, _: Option<&i32>) {
//!     *sm.object_mut() = 0;
//! }
//!
//! fn st_heating(sm: &mut MachineInstance<HeaterMachine>, target: Option<&i32>) {
//!     if let Some(target) = target {
//!         *sm.object_mut() = *target;
//!     }
//! }
//!
//! let descriptor = MachineBuilder::basic("Heater")
//!     .state(StateDescriptor::new(Heater::Off, st_off))
//!     .state(StateDescriptor::new(Heater::Heating, st_heating))
//!     .event(
//!         HeaterEvent::SetTarget,
//!         [Transition::To(Heater::Heating), Transition::To(Heater::Heating)],
//!     )
//!     .event(HeaterEvent::Shutdown, [Transition::Ignored, Transition::To(Heater::Off)])
//!     .build()
//!     .unwrap();
//!
//! let payloads = EventPayloadAllocator::new().unwrap();
//! let mut heater = MachineInstance::new("heater1", Arc::new(descriptor), 0);
//!
//! heater
//!     .dispatch(HeaterEvent::SetTarget, Some(payloads.payload(21).unwrap()))
//!     .unwrap();
//! assert_eq!(heater.get(|target| *target), 21);
//!
//! heater.dispatch(HeaterEvent::Shutdown, None).unwrap();
//! assert_eq!(heater.current_state(), Heater::Off);
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod fault;
pub mod memory;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use crate::core::{Event, MachineType, State, StateDescriptor, Transition};
pub use engine::{Dispatch, EngineKind, MachineDescriptor, MachineInstance};
pub use fault::{Fault, FaultKind, FaultResult};
pub use memory::{EventPayloadAllocator, FixedBlockPool, Payload, SizeClassAllocator};
pub use snapshot::{MachineSnapshot, SnapshotError, UsageReport};
