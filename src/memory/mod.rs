//! Deterministic payload memory.
//!
//! Three layers, leaves first:
//! - [`FixedBlockPool`]: one arena of equal blocks with a LIFO free list
//! - [`SizeClassAllocator`]: best-fit routing over pools, with an owner
//!   header in front of each allocation so freeing needs only the pointer
//! - [`EventPayloadAllocator`]: the fixed small/large instance the engine
//!   draws event data from, plus the typed [`Payload`] handle
//!
//! Arenas are reserved once at construction. Nothing grows afterwards, and
//! running out of blocks is a [`Fault`](crate::fault::Fault), not a fallback
//! to the global heap.

mod config;
mod error;
mod payload;
mod pool;
mod size_class;

pub use config::{AllocatorConfig, PoolConfig, SizeClassConfig};
pub use error::ConfigError;
pub use payload::{
    EventPayloadAllocator, Payload, LARGE_BLOCKS, LARGE_CAPACITY, SMALL_BLOCKS, SMALL_CAPACITY,
};
pub use pool::{FixedBlockPool, PoolStats, BLOCK_ALIGN};
pub use size_class::{SizeClassAllocator, HEADER_SIZE};
