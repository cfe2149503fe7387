//! Centrifuge Test State Machine
//!
//! This example runs a spin test on an extended machine.
//!
//! Key concepts:
//! - Guard: a test only starts while the centrifuge is at rest
//! - Entry action: entering Idle resets the rig
//! - Exit actions: leaving a wait state stops polling
//! - Self-transitions: wait states re-run their handler on every poll
//! - Snapshots: the position is saved and restored mid-run
//!
//! Run with: cargo run --example centrifuge

#[path = "machines/centrifuge.rs"]
mod centrifuge;

use centrifuge::{CentrifugeEvent, CentrifugeState, CentrifugeTest};
use fsmpool::{MachineInstance, MachineSnapshot};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("=== Centrifuge Test State Machine ===\n");

    let descriptor = Arc::new(centrifuge::descriptor()?);
    let mut test = MachineInstance::new(
        "CentrifugeTestSM",
        Arc::clone(&descriptor),
        CentrifugeTest::default(),
    );

    // Cancel before starting is ignored
    let outcome = test.dispatch(CentrifugeEvent::Cancel, None)?;
    println!("Cancel while idle: {outcome:?}");

    test.dispatch(CentrifugeEvent::Start, None)?;

    let mut polls = 0;
    while centrifuge::is_poll_active(&test) {
        test.dispatch(CentrifugeEvent::Poll, None)?;
        polls += 1;

        if polls == 3 {
            let snapshot = test.snapshot()?;
            println!("\nSnapshot after {polls} polls:\n{}", snapshot.to_json_pretty()?);

            let bytes = snapshot.to_bytes()?;
            let decoded = MachineSnapshot::<CentrifugeState>::from_bytes(&bytes)?;
            let mut replica = MachineInstance::new(
                "CentrifugeReplica",
                Arc::clone(&descriptor),
                CentrifugeTest::default(),
            );
            replica.restore(&decoded)?;
            println!("Replica restored into {:?}\n", replica.current_state());
        }
    }

    println!("\nTest finished after {polls} polls");
    println!("Final state: {:?}", test.current_state());
    println!("Completed runs: {}", test.object().completed);

    println!("\n=== Example Complete ===");
    Ok(())
}
