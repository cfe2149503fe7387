//! Property-based tests for the pools, the size-class allocator and the
//! dispatch engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use fsmpool::core::State;
use fsmpool::memory::{
    AllocatorConfig, FixedBlockPool, PoolConfig, SizeClassAllocator, HEADER_SIZE,
};
use fsmpool::snapshot::SNAPSHOT_VERSION;
use fsmpool::{
    event_enum, state_enum, Dispatch, FaultKind, MachineBuilder, MachineInstance,
    MachineSnapshot, MachineType, StateDescriptor, Transition,
};
use proptest::prelude::*;
use std::cell::Cell;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use uuid::Uuid;

// ---- pools ----------------------------------------------------------------

fn pool(block_size: usize, blocks: usize) -> FixedBlockPool {
    FixedBlockPool::new(&PoolConfig::new("prop", block_size, blocks)).unwrap()
}

proptest! {
    #[test]
    fn released_blocks_are_always_reusable(blocks in 1..64usize, rounds in 1..4usize) {
        let pool = pool(24, blocks);

        for _ in 0..rounds {
            let held: Vec<_> = (0..blocks).map(|_| pool.alloc(24).unwrap()).collect();
            for block in held {
                unsafe { pool.free(Some(block)) };
            }
        }

        prop_assert_eq!(pool.blocks_in_use(), 0);
        prop_assert_eq!(pool.max_blocks_in_use(), blocks);
    }

    #[test]
    fn acquiring_past_capacity_faults(blocks in 1..64usize) {
        let pool = pool(8, blocks);
        let _held: Vec<_> = (0..blocks).map(|_| pool.alloc(8).unwrap()).collect();

        let fault = pool.alloc(8).unwrap_err();
        let exhausted = matches!(fault.kind(), FaultKind::PoolExhausted { .. });
        prop_assert!(exhausted);
    }

    #[test]
    fn in_use_tracks_live_blocks(ops in prop::collection::vec(any::<bool>(), 0..200)) {
        let pool = pool(16, 16);
        let mut live: Vec<NonNull<u8>> = Vec::new();

        for alloc in ops {
            if alloc {
                match pool.alloc(16) {
                    Ok(block) => live.push(block),
                    Err(_) => prop_assert_eq!(live.len(), pool.capacity()),
                }
            } else if let Some(block) = live.pop() {
                unsafe { pool.free(Some(block)) };
            }

            prop_assert_eq!(pool.blocks_in_use(), live.len());
            prop_assert!(pool.blocks_in_use() <= pool.capacity());
        }

        let mut addresses: Vec<_> = live.iter().map(|block| block.as_ptr() as usize).collect();
        addresses.sort_unstable();
        addresses.dedup();
        prop_assert_eq!(addresses.len(), live.len());
    }
}

// ---- size classes -----------------------------------------------------------

fn allocator() -> SizeClassAllocator {
    SizeClassAllocator::from_config(
        &AllocatorConfig::default()
            .class("tiny", 8, 8)
            .class("small", 32, 8)
            .class("large", 128, 8),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn requests_use_the_smallest_fitting_class(size in 0..=128usize) {
        let alloc = allocator();
        let chosen = alloc.pool_for(size).unwrap();

        prop_assert!(chosen.block_size() >= size + HEADER_SIZE);
        for smaller in alloc.pools().iter().take_while(|p| p.block_size() < chosen.block_size()) {
            prop_assert!(smaller.block_size() < size + HEADER_SIZE);
        }
    }

    #[test]
    fn alloc_free_round_trip_spares_neighbours(size in 1..=128usize, fill in any::<u8>()) {
        let alloc = allocator();
        let before = alloc.alloc(size).unwrap();
        let after = alloc.alloc(size).unwrap();
        unsafe {
            ptr::write_bytes(before.as_ptr(), 0xA5, size);
            ptr::write_bytes(after.as_ptr(), 0x5A, size);
        }

        let middle = alloc.alloc(size).unwrap();
        unsafe {
            ptr::write_bytes(middle.as_ptr(), fill, alloc.usable_size(middle));
            alloc.free(Some(middle));
        }

        let before_bytes = unsafe { std::slice::from_raw_parts(before.as_ptr(), size) };
        let after_bytes = unsafe { std::slice::from_raw_parts(after.as_ptr(), size) };
        prop_assert!(before_bytes.iter().all(|&b| b == 0xA5));
        prop_assert!(after_bytes.iter().all(|&b| b == 0x5A));
        unsafe {
            prop_assert_eq!(alloc.owning_pool(before).name(), alloc.pool_for(size).unwrap().name());
            prop_assert_eq!(alloc.owning_pool(after).name(), alloc.pool_for(size).unwrap().name());
        }
    }

    #[test]
    fn realloc_preserves_common_prefix(old_size in 1..=128usize, new_size in 1..=128usize) {
        let alloc = allocator();
        let old = alloc.alloc(old_size).unwrap();
        for i in 0..old_size {
            unsafe { old.as_ptr().add(i).write(i as u8) };
        }

        let new = unsafe { alloc.realloc(Some(old), new_size) }.unwrap().unwrap();

        let keep = old_size.min(new_size);
        let bytes = unsafe { std::slice::from_raw_parts(new.as_ptr(), keep) };
        prop_assert!(bytes.iter().enumerate().all(|(i, &b)| b == i as u8));

        let live: usize = alloc.pools().iter().map(|p| p.blocks_in_use()).sum();
        prop_assert_eq!(live, 1);
    }
}

// ---- engine -----------------------------------------------------------------

state_enum! {
    enum Cell4 {
        S0,
        S1,
        S2,
        S3,
    }
}

event_enum! {
    enum Stimulus {
        E0,
        E1,
    }
}

#[derive(Default)]
struct Calls {
    allow: bool,
    guards: Cell<usize>,
    handlers: usize,
    entries: usize,
    exits: usize,
}

impl Calls {
    fn total(&self) -> usize {
        self.guards.get() + self.handlers + self.entries + self.exits
    }
}

struct Probe;

impl MachineType for Probe {
    type State = Cell4;
    type Event = Stimulus;
    type Object = Calls;
    type Data = ();
}

type Sm = MachineInstance<Probe>;

fn st(sm: &mut Sm, _: Option<&()>) {
    sm.object_mut().handlers += 1;
}

fn gd(sm: &Sm, _: Option<&()>) -> bool {
    let calls = sm.object();
    calls.guards.set(calls.guards.get() + 1);
    calls.allow
}

fn en(sm: &mut Sm, _: Option<&()>) {
    sm.object_mut().entries += 1;
}

fn ex(sm: &mut Sm) {
    sm.object_mut().exits += 1;
}

fn entry() -> impl Strategy<Value = Transition<Cell4>> {
    prop_oneof![
        Just(Transition::Ignored),
        (0..Cell4::COUNT).prop_map(|id| Transition::To(Cell4::from_id(id).unwrap())),
    ]
}

fn table() -> impl Strategy<Value = Vec<Transition<Cell4>>> {
    prop::collection::vec(entry(), Cell4::COUNT)
}

fn probe(e0: Vec<Transition<Cell4>>, e1: Vec<Transition<Cell4>>, start: Cell4, allow: bool) -> Sm {
    let states = (0..Cell4::COUNT).map(|id| {
        StateDescriptor::new(Cell4::from_id(id).unwrap(), st)
            .with_guard(gd)
            .with_entry(en)
            .with_exit(ex)
    });
    let descriptor = MachineBuilder::extended("Probe")
        .states(states)
        .event(Stimulus::E0, e0)
        .event(Stimulus::E1, e1)
        .build()
        .unwrap();

    let mut sm = MachineInstance::new(
        "probe",
        Arc::new(descriptor),
        Calls {
            allow,
            ..Calls::default()
        },
    );
    sm.restore(&MachineSnapshot {
        version: SNAPSHOT_VERSION,
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        machine: "Probe".to_string(),
        instance: "probe".to_string(),
        current_state: start,
    })
    .unwrap();
    sm
}

fn any_state() -> impl Strategy<Value = Cell4> {
    (0..Cell4::COUNT).prop_map(|id| Cell4::from_id(id).unwrap())
}

proptest! {
    #[test]
    fn dispatch_follows_the_table(
        e0 in table(),
        e1 in table(),
        start in any_state(),
        use_e1 in any::<bool>(),
        allow in any::<bool>(),
    ) {
        let (event, row) = if use_e1 {
            (Stimulus::E1, e1.clone())
        } else {
            (Stimulus::E0, e0.clone())
        };
        let expected = row[start.id()];
        let mut sm = probe(e0, e1, start, allow);

        let outcome = sm.dispatch(event, None).unwrap();
        let calls = sm.object();

        match expected {
            Transition::Ignored => {
                prop_assert_eq!(outcome, Dispatch::Ignored);
                prop_assert_eq!(sm.current_state(), start);
                prop_assert_eq!(calls.total(), 0);
            }
            Transition::To(_) if !allow => {
                prop_assert_eq!(outcome, Dispatch::Vetoed { steps: 0 });
                prop_assert_eq!(sm.current_state(), start);
                prop_assert_eq!(calls.guards.get(), 1);
                prop_assert_eq!(calls.entries + calls.exits + calls.handlers, 0);
            }
            Transition::To(target) => {
                prop_assert_eq!(outcome, Dispatch::Completed { steps: 1 });
                prop_assert_eq!(sm.current_state(), target);
                prop_assert_eq!(calls.handlers, 1);
                let hooks = usize::from(target != start);
                prop_assert_eq!(calls.entries, hooks);
                prop_assert_eq!(calls.exits, hooks);
            }
            Transition::CannotHappen => unreachable!("not generated"),
        }
    }

    #[test]
    fn cannot_happen_always_faults(start in any_state(), allow in any::<bool>()) {
        let impossible = vec![Transition::CannotHappen; Cell4::COUNT];
        let mut sm = probe(impossible.clone(), impossible, start, allow);

        let fault = sm.dispatch(Stimulus::E0, None).unwrap_err();

        let is_cannot_happen = matches!(fault.kind(), FaultKind::CannotHappen { .. });
        prop_assert!(is_cannot_happen);
        prop_assert_eq!(sm.current_state(), start);
        prop_assert_eq!(sm.object().total(), 0);
    }
}
