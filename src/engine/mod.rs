//! Running state machines.
//!
//! A [`MachineDescriptor`] is the constant part of a machine: state table,
//! transition tables and engine kind. A [`MachineInstance`] is the mutable
//! part: current state, pending transition and the domain object. Events are
//! delivered with [`MachineInstance::dispatch`] and resolved by the basic or
//! extended drain loop depending on [`EngineKind`].
//!
//! # Example
//!
//! ```rust
//! use fsmpool::builder::MachineBuilder;
//! use fsmpool::core::{MachineType, StateDescriptor, Transition};
//! use fsmpool::engine::{Dispatch, MachineInstance};
//! use fsmpool::{event_enum, state_enum};
//! use std::sync::Arc;
//!
//! state_enum! {
//!     enum Light {
//!         Off,
//!         On,
//!     }
//! }
//!
//! event_enum! {
//!     enum Button {
//!         Press,
//!     }
//! }
//!
//! struct LightMachine;
//!
//! impl MachineType for LightMachine {
//!     type State = Light;
//!     type Event = Button;
//!     type Object = u32;
//!     type Data = ();
//! }
//!
//! fn st_off(_: &mut MachineInstance<LightMachine>, _: Option<&()>) {}
//!
//! fn st_on(sm: &mut MachineInstance<LightMachine>, _: Option<&()>) {
//!     *sm.object_mut() += 1;
//! }
//!
//! let descriptor = MachineBuilder::basic("Light")
//!     .state(StateDescriptor::new(Light::Off, st_off))
//!     .state(StateDescriptor::new(Light::On, st_on))
//!     .event(Button::Press, [Transition::To(Light::On), Transition::To(Light::Off)])
//!     .build()
//!     .unwrap();
//!
//! let mut light = MachineInstance::new("hall", Arc::new(descriptor), 0);
//! let outcome = light.dispatch(Button::Press, None).unwrap();
//!
//! assert_eq!(outcome, Dispatch::Completed { steps: 1 });
//! assert_eq!(light.current_state(), Light::On);
//! assert_eq!(light.get(|count| *count), 1);
//! ```

mod descriptor;
mod dispatch;
mod instance;

pub use descriptor::{EngineKind, MachineDescriptor};
pub use dispatch::Dispatch;
pub use instance::MachineInstance;
