//! Fixed-block pool.
//!
//! One arena is reserved when the pool is built and carved into equal blocks.
//! Released blocks go on an intrusive LIFO free list threaded through their
//! first word, so the most recently freed (cache-hot) block is reused first.
//! The arena is never compacted and never grows; when the free list is empty
//! and every block has been issued, allocation faults.
//!
//! ```text
//!  arena:  [ live ][ free ][ live ][ free ][ unissued ][ unissued ]
//!                     ^               |
//!  head ──────────────┼───────────────┘
//!                     └── next ──> None
//! ```

use super::config::PoolConfig;
use super::error::ConfigError;
use crate::fault::{Fault, FaultKind, FaultResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Alignment of every block.
pub const BLOCK_ALIGN: usize = 8;

/// A free block must be able to hold the free-list link.
const MIN_BLOCK_SIZE: usize = mem::size_of::<FreeBlock>();

/// Link stored in the first word of a released block.
#[repr(C)]
struct FreeBlock {
    next: Option<NonNull<FreeBlock>>,
}

/// Free-list head and the arena cursor. Guarded by the pool lock.
struct FreeList {
    head: Option<NonNull<FreeBlock>>,
    issued: usize,
}

// SAFETY: the pointers name blocks inside the pool's own arena and are only
// dereferenced while the pool lock is held.
unsafe impl Send for FreeList {}

/// Usage counters. Updated outside the lock, so a snapshot taken while other
/// threads allocate may be momentarily inconsistent.
#[derive(Default)]
struct Counters {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    in_use: AtomicUsize,
    max_in_use: AtomicUsize,
}

impl Counters {
    fn record_alloc(&self) -> usize {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let in_use = self.in_use.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_use.fetch_max(in_use, Ordering::Relaxed);
        in_use
    }

    fn record_free(&self) -> usize {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.in_use
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1)
    }
}

/// Point-in-time usage of one pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub name: String,
    pub block_size: usize,
    pub capacity: usize,
    pub blocks_in_use: usize,
    pub max_blocks_in_use: usize,
    pub allocations: usize,
    pub deallocations: usize,
}

/// A pool of equal-size blocks carved from one fixed arena.
pub struct FixedBlockPool {
    name: String,
    arena: NonNull<u8>,
    layout: Layout,
    block_size: usize,
    capacity: usize,
    free: Mutex<FreeList>,
    counters: Counters,
}

// SAFETY: the arena is owned by the pool; free-list and cursor mutation is
// serialized by `free`, and every issued block is handed to exactly one owner.
unsafe impl Send for FixedBlockPool {}
unsafe impl Sync for FixedBlockPool {}

impl FixedBlockPool {
    /// Reserve the arena for `config`.
    ///
    /// The block size is rounded up to [`BLOCK_ALIGN`] and to at least one
    /// pointer so a released block can hold the free-list link.
    pub fn new(config: &PoolConfig) -> Result<Self, ConfigError> {
        if config.block_count == 0 {
            return Err(ConfigError::ZeroBlocks {
                pool: config.name.clone(),
            });
        }

        let too_large = || ConfigError::ArenaTooLarge {
            pool: config.name.clone(),
            block_size: config.block_size,
            blocks: config.block_count,
        };

        let block_size = config
            .block_size
            .max(MIN_BLOCK_SIZE)
            .checked_next_multiple_of(BLOCK_ALIGN)
            .ok_or_else(too_large)?;
        let arena_size = block_size
            .checked_mul(config.block_count)
            .ok_or_else(too_large)?;
        let layout = Layout::from_size_align(arena_size, BLOCK_ALIGN).map_err(|_| too_large())?;

        // SAFETY: `layout` is non-zero sized, both factors are at least one.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(arena) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        tracing::debug!(
            pool = %config.name,
            block_size,
            blocks = config.block_count,
            "pool arena reserved"
        );

        Ok(Self {
            name: config.name.clone(),
            arena,
            layout,
            block_size,
            capacity: config.block_count,
            free: Mutex::new(FreeList {
                head: None,
                issued: 0,
            }),
            counters: Counters::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block size after rounding.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks in the arena.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn blocks_in_use(&self) -> usize {
        self.counters.in_use.load(Ordering::Relaxed)
    }

    pub fn max_blocks_in_use(&self) -> usize {
        self.counters.max_in_use.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            name: self.name.clone(),
            block_size: self.block_size,
            capacity: self.capacity,
            blocks_in_use: self.blocks_in_use(),
            max_blocks_in_use: self.max_blocks_in_use(),
            allocations: self.counters.allocations.load(Ordering::Relaxed),
            deallocations: self.counters.deallocations.load(Ordering::Relaxed),
        }
    }

    /// True if `ptr` is the start of one of this pool's blocks.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let start = self.arena.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr - start < self.layout.size() && (addr - start) % self.block_size == 0
    }

    /// Allocate one block able to hold `size` bytes.
    ///
    /// Faults if `size` exceeds the block size, or if every block is live.
    #[track_caller]
    pub fn alloc(&self, size: usize) -> FaultResult<NonNull<u8>> {
        if size > self.block_size {
            return Err(Fault::raise(FaultKind::RequestTooLarge {
                pool: self.name.clone(),
                requested: size,
                block_size: self.block_size,
            }));
        }

        let Some(block) = self.acquire() else {
            return Err(Fault::raise(FaultKind::PoolExhausted {
                pool: self.name.clone(),
                capacity: self.capacity,
            }));
        };

        let in_use = self.counters.record_alloc();
        tracing::trace!(pool = %self.name, in_use, "block acquired");
        Ok(block)
    }

    /// Allocate a block for `num * size` bytes and zero them.
    #[track_caller]
    pub fn calloc(&self, num: usize, size: usize) -> FaultResult<NonNull<u8>> {
        let Some(total) = num.checked_mul(size) else {
            return Err(Fault::raise(FaultKind::SizeOverflow));
        };
        let block = self.alloc(total)?;
        // SAFETY: the block is live, exclusively ours and at least `total` bytes.
        unsafe { ptr::write_bytes(block.as_ptr(), 0, total) };
        Ok(block)
    }

    /// Return a block to the free list. `None` is a no-op.
    ///
    /// # Safety
    ///
    /// `block` must have come from this pool's [`alloc`](Self::alloc) or
    /// [`calloc`](Self::calloc) and must not be released twice. Double release
    /// is not detected in release builds.
    pub unsafe fn free(&self, block: Option<NonNull<u8>>) {
        let Some(block) = block else {
            return;
        };
        debug_assert!(
            self.owns(block),
            "block {block:p} does not belong to pool '{}'",
            self.name
        );

        self.release(block);
        let in_use = self.counters.record_free();
        tracing::trace!(pool = %self.name, in_use, "block released");
    }

    /// Pop the free list, else carve the next unissued block.
    fn acquire(&self) -> Option<NonNull<u8>> {
        let mut free = self.free.lock();

        if let Some(block) = free.head {
            // SAFETY: every free-list entry was written by `release` and is
            // not live, so its link word is initialized and unaliased.
            free.head = unsafe { (*block.as_ptr()).next };
            return Some(block.cast());
        }

        if free.issued < self.capacity {
            let offset = free.issued * self.block_size;
            free.issued += 1;
            // SAFETY: offset < capacity * block_size, the arena length.
            return Some(unsafe { NonNull::new_unchecked(self.arena.as_ptr().add(offset)) });
        }

        None
    }

    /// # Safety
    ///
    /// `block` is a dead block of this pool.
    unsafe fn release(&self, block: NonNull<u8>) {
        let node = block.cast::<FreeBlock>();
        let mut free = self.free.lock();
        node.as_ptr().write(FreeBlock { next: free.head });
        free.head = Some(node);
    }
}

impl Drop for FixedBlockPool {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this exact layout.
        unsafe { alloc::dealloc(self.arena.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for FixedBlockPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBlockPool")
            .field("name", &self.name)
            .field("block_size", &self.block_size)
            .field("capacity", &self.capacity)
            .field("blocks_in_use", &self.blocks_in_use())
            .finish()
    }
}
