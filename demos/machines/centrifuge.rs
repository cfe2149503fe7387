//! Centrifuge test sequencer.
//!
//! Runs a spin test: accelerate to speed, decelerate to rest, report. The
//! wait states re-enter themselves on every `Poll` until their target is
//! reached, which is why they use exit actions rather than entry actions to
//! stop polling.

use fsmpool::{
    event_enum, state_enum, BuildError, MachineBuilder, MachineDescriptor, MachineInstance,
    MachineType, StateDescriptor, Transition,
};

/// Speed at which acceleration ends.
pub const TARGET_SPEED: i32 = 5;

state_enum! {
    pub enum CentrifugeState {
        Idle,
        Completed,
        Failed,
        StartTest,
        Acceleration,
        WaitForAcceleration,
        Deceleration,
        WaitForDeceleration,
    }
}

event_enum! {
    pub enum CentrifugeEvent {
        Start,
        Cancel,
        Poll,
    }
}

#[derive(Debug, Default)]
pub struct CentrifugeTest {
    pub speed: i32,
    pub poll_active: bool,
    /// Completed and failed runs, for reporting.
    pub completed: usize,
    pub failed: usize,
}

pub struct CentrifugeMachine;

impl MachineType for CentrifugeMachine {
    type State = CentrifugeState;
    type Event = CentrifugeEvent;
    type Object = CentrifugeTest;
    type Data = ();
}

pub type CentrifugeSm = MachineInstance<CentrifugeMachine>;

pub fn descriptor() -> Result<MachineDescriptor<CentrifugeMachine>, BuildError> {
    use CentrifugeState::*;
    use Transition::{CannotHappen as X, Ignored as I, To};

    MachineBuilder::extended("CentrifugeTest")
        .state(StateDescriptor::new(Idle, st_idle).with_entry(en_idle))
        .state(StateDescriptor::new(Completed, st_completed))
        .state(StateDescriptor::new(Failed, st_failed))
        .state(StateDescriptor::new(StartTest, st_start_test).with_guard(gd_start_test))
        .state(StateDescriptor::new(Acceleration, st_acceleration))
        .state(
            StateDescriptor::new(WaitForAcceleration, st_wait_for_acceleration)
                .with_exit(ex_wait_for_acceleration),
        )
        .state(StateDescriptor::new(Deceleration, st_deceleration))
        .state(
            StateDescriptor::new(WaitForDeceleration, st_wait_for_deceleration)
                .with_exit(ex_wait_for_deceleration),
        )
        .event(CentrifugeEvent::Start, [To(StartTest), X, X, I, I, I, I, I])
        .event(
            CentrifugeEvent::Cancel,
            [I, X, X, To(Failed), To(Failed), To(Failed), To(Failed), To(Failed)],
        )
        .event(
            CentrifugeEvent::Poll,
            [
                I,
                I,
                I,
                I,
                To(WaitForAcceleration),
                To(WaitForAcceleration),
                To(WaitForDeceleration),
                To(WaitForDeceleration),
            ],
        )
        .build()
}

pub fn is_poll_active(sm: &CentrifugeSm) -> bool {
    sm.get(|test| test.poll_active)
}

pub fn speed(sm: &CentrifugeSm) -> i32 {
    sm.get(|test| test.speed)
}

fn st_idle(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_Idle");
}

fn en_idle(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "EN_Idle");
    let test = sm.object_mut();
    test.speed = 0;
    test.poll_active = false;
}

fn st_completed(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_Completed");
    sm.object_mut().completed += 1;
    sm.internal_event(CentrifugeState::Idle, None);
}

fn st_failed(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_Failed");
    sm.object_mut().failed += 1;
    sm.internal_event(CentrifugeState::Idle, None);
}

fn st_start_test(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_StartTest");
    sm.internal_event(CentrifugeState::Acceleration, None);
}

/// Only a stopped centrifuge may start a test.
fn gd_start_test(sm: &CentrifugeSm, _: Option<&()>) -> bool {
    tracing::info!(test = %sm.name(), "GD_StartTest");
    speed(sm) == 0
}

fn st_acceleration(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_Acceleration");
    sm.object_mut().poll_active = true;
}

fn st_wait_for_acceleration(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), speed = speed(sm), "ST_WaitForAcceleration");
    let test = sm.object_mut();
    test.speed += 1;
    if test.speed >= TARGET_SPEED {
        sm.internal_event(CentrifugeState::Deceleration, None);
    }
}

fn ex_wait_for_acceleration(sm: &mut CentrifugeSm) {
    tracing::info!(test = %sm.name(), "EX_WaitForAcceleration");
    sm.object_mut().poll_active = false;
}

fn st_deceleration(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), "ST_Deceleration");
    sm.object_mut().poll_active = true;
}

fn st_wait_for_deceleration(sm: &mut CentrifugeSm, _: Option<&()>) {
    tracing::info!(test = %sm.name(), speed = speed(sm), "ST_WaitForDeceleration");
    let test = sm.object_mut();
    let stopped = test.speed == 0;
    test.speed -= 1;
    if stopped {
        sm.internal_event(CentrifugeState::Completed, None);
    }
}

fn ex_wait_for_deceleration(sm: &mut CentrifugeSm) {
    tracing::info!(test = %sm.name(), "EX_WaitForDeceleration");
    sm.object_mut().poll_active = false;
}
