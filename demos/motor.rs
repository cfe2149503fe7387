//! Motor State Machine
//!
//! This example drives two motors that share one machine descriptor.
//!
//! Key concepts:
//! - Basic machine: state handlers only
//! - Event payloads drawn from the fixed payload pools
//! - Internal transitions (Stop falls through to Idle)
//! - Ignored events
//!
//! Run with: cargo run --example motor

#[path = "machines/motor.rs"]
mod motor;

use fsmpool::{EventPayloadAllocator, MachineInstance, UsageReport};
use motor::{Motor, MotorData, MotorEvent};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Motor State Machine ===\n");

    let payloads = EventPayloadAllocator::new()?;
    let descriptor = Arc::new(motor::descriptor()?);

    let mut motor1 = MachineInstance::new("Motor1SM", Arc::clone(&descriptor), Motor::default());
    let mut motor2 = MachineInstance::new("Motor2SM", Arc::clone(&descriptor), Motor::default());

    // Start, then change speed
    motor1.dispatch(
        MotorEvent::SetSpeed,
        Some(payloads.payload(MotorData { speed: 100 })?),
    )?;
    motor1.dispatch(
        MotorEvent::SetSpeed,
        Some(payloads.payload(MotorData { speed: 200 })?),
    )?;
    println!("Motor1 speed: {}", motor::speed(&motor1));

    // Stop, then stop again: the second halt is ignored in Idle
    motor1.dispatch(MotorEvent::Halt, None)?;
    let outcome = motor1.dispatch(MotorEvent::Halt, None)?;
    println!("Motor1 second halt: {outcome:?}");

    motor2.dispatch(
        MotorEvent::SetSpeed,
        Some(payloads.payload(MotorData { speed: 300 })?),
    )?;
    motor2.dispatch(MotorEvent::Halt, None)?;

    println!("\nMotor1 state: {:?}", motor1.current_state());
    println!("Motor2 state: {:?}", motor2.current_state());

    let report = UsageReport::capture(payloads.allocator());
    println!("\nPayload pool usage:\n{}", report.to_json()?);

    println!("\n=== Example Complete ===");
    Ok(())
}
