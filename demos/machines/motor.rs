//! Motor control machine.
//!
//! ```text
//!            SetSpeed              SetSpeed
//!  Idle ─────────────> Start ─────────────> ChangeSpeed ─┐
//!   ^                    │ Halt                │  ^       │ SetSpeed
//!   │  (internal)        v                     │  └───────┘
//!   └──────────────── Stop <───────────────────┘ Halt
//! ```

use fsmpool::{
    event_enum, state_enum, BuildError, MachineBuilder, MachineDescriptor, MachineInstance,
    MachineType, StateDescriptor, Transition,
};

state_enum! {
    pub enum MotorState {
        Idle,
        Stop,
        Start,
        ChangeSpeed,
    }
}

event_enum! {
    pub enum MotorEvent {
        SetSpeed,
        Halt,
    }
}

/// The motor the machine drives.
#[derive(Debug, Default)]
pub struct Motor {
    pub current_speed: i32,
}

/// Payload of `SetSpeed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorData {
    pub speed: i32,
}

pub struct MotorMachine;

impl MachineType for MotorMachine {
    type State = MotorState;
    type Event = MotorEvent;
    type Object = Motor;
    type Data = MotorData;
}

pub type MotorSm = MachineInstance<MotorMachine>;

pub fn descriptor() -> Result<MachineDescriptor<MotorMachine>, BuildError> {
    use MotorState::*;
    use Transition::{CannotHappen, Ignored, To};

    MachineBuilder::basic("Motor")
        .state(StateDescriptor::new(Idle, st_idle))
        .state(StateDescriptor::new(Stop, st_stop))
        .state(StateDescriptor::new(Start, st_start))
        .state(StateDescriptor::new(ChangeSpeed, st_change_speed))
        //                                Idle       Stop          Start            ChangeSpeed
        .event(MotorEvent::SetSpeed, [To(Start), CannotHappen, To(ChangeSpeed), To(ChangeSpeed)])
        .event(MotorEvent::Halt, [Ignored, CannotHappen, To(Stop), To(Stop)])
        .build()
}

/// Current speed. Reads the motor only.
pub fn speed(sm: &MotorSm) -> i32 {
    sm.get(|motor| motor.current_speed)
}

fn st_idle(sm: &mut MotorSm, _: Option<&MotorData>) {
    tracing::info!(motor = %sm.name(), "ST_Idle");
}

fn st_stop(sm: &mut MotorSm, _: Option<&MotorData>) {
    sm.object_mut().current_speed = 0;
    tracing::info!(motor = %sm.name(), speed = 0, "ST_Stop");

    sm.internal_event(MotorState::Idle, None);
}

fn st_start(sm: &mut MotorSm, data: Option<&MotorData>) {
    apply_speed(sm, data);
    tracing::info!(motor = %sm.name(), speed = speed(sm), "ST_Start");
}

fn st_change_speed(sm: &mut MotorSm, data: Option<&MotorData>) {
    apply_speed(sm, data);
    tracing::info!(motor = %sm.name(), speed = speed(sm), "ST_ChangeSpeed");
}

fn apply_speed(sm: &mut MotorSm, data: Option<&MotorData>) {
    match data {
        Some(data) => sm.object_mut().current_speed = data.speed,
        None => tracing::warn!(motor = %sm.name(), "speed event without payload"),
    }
}
