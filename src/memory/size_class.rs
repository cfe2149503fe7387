//! Size-class allocator.
//!
//! Routes each request to the smallest pool that fits it plus a one-word
//! header. The header records the owning pool, so `free` and `realloc` need
//! only the client pointer:
//!
//! ```text
//!  block:  [ BlockHeader { pool } | client bytes ................ ]
//!          ^                       ^
//!          pool block start        pointer handed to the caller
//! ```

use super::config::AllocatorConfig;
use super::error::ConfigError;
use super::pool::{FixedBlockPool, PoolStats, BLOCK_ALIGN};
use crate::fault::{Fault, FaultKind, FaultResult};
use std::mem;
use std::ptr::{self, NonNull};

/// Owner record written in front of every client region.
#[repr(C, align(8))]
struct BlockHeader {
    pool: NonNull<FixedBlockPool>,
}

/// Bytes of metadata in front of each client region.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

// Client pointers keep block alignment only if the header preserves it.
const _: () = assert!(HEADER_SIZE % BLOCK_ALIGN == 0);

/// Pools ordered by ascending block size.
#[derive(Debug)]
pub struct SizeClassAllocator {
    pools: Box<[FixedBlockPool]>,
}

impl SizeClassAllocator {
    /// Take ownership of `pools`, sorting them by block size.
    pub fn new(mut pools: Vec<FixedBlockPool>) -> Result<Self, ConfigError> {
        if pools.is_empty() {
            return Err(ConfigError::NoPools);
        }
        pools.sort_by_key(FixedBlockPool::block_size);

        Ok(Self {
            pools: pools.into_boxed_slice(),
        })
    }

    pub fn from_config(config: &AllocatorConfig) -> Result<Self, ConfigError> {
        let pools = config
            .classes
            .iter()
            .map(|class| FixedBlockPool::new(&class.pool_config()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pools)
    }

    /// Pools, smallest block first.
    pub fn pools(&self) -> &[FixedBlockPool] {
        &self.pools
    }

    /// Largest request any class can serve.
    pub fn max_request(&self) -> usize {
        self.pools
            .last()
            .map_or(0, |pool| pool.block_size() - HEADER_SIZE)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.pools.iter().map(FixedBlockPool::stats).collect()
    }

    /// The pool a request of `size` bytes would be served from.
    pub fn pool_for(&self, size: usize) -> Option<&FixedBlockPool> {
        let needed = size.checked_add(HEADER_SIZE)?;
        self.pools.iter().find(|pool| pool.block_size() >= needed)
    }

    /// Allocate at least `size` bytes, aligned to [`BLOCK_ALIGN`].
    ///
    /// Faults if no class is large enough or the chosen pool is exhausted.
    /// A request never spills into a larger class.
    #[track_caller]
    pub fn alloc(&self, size: usize) -> FaultResult<NonNull<u8>> {
        let Some(pool) = self.pool_for(size) else {
            return Err(Fault::raise(FaultKind::NoSizeClass {
                requested: size,
                largest: self.max_request(),
            }));
        };

        let block = pool.alloc(size + HEADER_SIZE)?;
        // SAFETY: the block is live, aligned to BLOCK_ALIGN and larger than
        // HEADER_SIZE, so both the header write and the offset stay inside it.
        unsafe {
            block.cast::<BlockHeader>().as_ptr().write(BlockHeader {
                pool: NonNull::from(pool),
            });
            Ok(NonNull::new_unchecked(block.as_ptr().add(HEADER_SIZE)))
        }
    }

    /// Allocate `num * size` zeroed bytes.
    #[track_caller]
    pub fn calloc(&self, num: usize, size: usize) -> FaultResult<NonNull<u8>> {
        let Some(total) = num.checked_mul(size) else {
            return Err(Fault::raise(FaultKind::SizeOverflow));
        };
        let ptr = self.alloc(total)?;
        // SAFETY: `alloc` returned at least `total` writable bytes.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, total) };
        Ok(ptr)
    }

    /// Release memory from [`alloc`](Self::alloc). `None` is a no-op.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator and not freed since.
    /// The header in front of it must be intact; corruption is not detected
    /// in release builds.
    pub unsafe fn free(&self, ptr: Option<NonNull<u8>>) {
        let Some(ptr) = ptr else {
            return;
        };
        let pool = self.owning_pool(ptr);
        pool.free(Some(Self::header(ptr).cast()));
    }

    /// Resize an allocation.
    ///
    /// `None` behaves as [`alloc`](Self::alloc); a zero `new_size` frees `ptr`
    /// and returns `None`. Otherwise a new block is taken, the first
    /// `min(usable_size(ptr), new_size)` bytes are copied and the old block is
    /// freed. The old block is untouched if the new allocation faults.
    ///
    /// # Safety
    ///
    /// Same contract as [`free`](Self::free) for `ptr`.
    #[track_caller]
    pub unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> FaultResult<Option<NonNull<u8>>> {
        let Some(old) = ptr else {
            return self.alloc(new_size).map(Some);
        };

        if new_size == 0 {
            self.free(Some(old));
            return Ok(None);
        }

        let new = self.alloc(new_size)?;
        let keep = self.usable_size(old).min(new_size);
        ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), keep);
        self.free(Some(old));
        Ok(Some(new))
    }

    /// Client bytes available behind `ptr`: its block size minus the header.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live allocation of this allocator.
    pub unsafe fn usable_size(&self, ptr: NonNull<u8>) -> usize {
        self.owning_pool(ptr).block_size() - HEADER_SIZE
    }

    /// Recover the pool that served `ptr` from its header.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live allocation of this allocator.
    pub unsafe fn owning_pool(&self, ptr: NonNull<u8>) -> &FixedBlockPool {
        let pool = Self::header(ptr).as_ref().pool;
        debug_assert!(
            self.pools.iter().any(|p| ptr::eq(p, pool.as_ptr())),
            "header of {ptr:p} does not name a pool of this allocator"
        );
        // SAFETY: the pool lives in `self.pools`, which outlives `&self`.
        pool.as_ref()
    }

    /// # Safety
    ///
    /// `ptr` was produced by `alloc`, so a header precedes it.
    unsafe fn header(ptr: NonNull<u8>) -> NonNull<BlockHeader> {
        NonNull::new_unchecked(ptr.as_ptr().sub(HEADER_SIZE)).cast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> SizeClassAllocator {
        SizeClassAllocator::from_config(
            &AllocatorConfig::default()
                .class("small", 32, 4)
                .class("large", 128, 2),
        )
        .unwrap()
    }

    fn fill(ptr: NonNull<u8>, len: usize, byte: u8) {
        unsafe { ptr::write_bytes(ptr.as_ptr(), byte, len) };
    }

    fn bytes<'a>(ptr: NonNull<u8>, len: usize) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }
    }

    #[test]
    fn requests_route_to_smallest_fitting_class() {
        let alloc = allocator();

        let small = alloc.alloc(10).unwrap();
        let large = alloc.alloc(100).unwrap();

        unsafe {
            assert_eq!(alloc.owning_pool(small).name(), "small");
            assert_eq!(alloc.owning_pool(large).name(), "large");
        }
    }

    #[test]
    fn class_boundary_is_inclusive() {
        let alloc = allocator();
        assert_eq!(alloc.pool_for(32).unwrap().name(), "small");
        assert_eq!(alloc.pool_for(33).unwrap().name(), "large");
        assert_eq!(alloc.pool_for(128).unwrap().name(), "large");
        assert!(alloc.pool_for(129).is_none());
    }

    #[test]
    fn oversized_request_is_a_fault() {
        let alloc = allocator();
        let fault = alloc.alloc(200).unwrap_err();
        assert_eq!(
            fault.kind(),
            &FaultKind::NoSizeClass {
                requested: 200,
                largest: 128,
            }
        );
    }

    #[test]
    fn full_class_faults_instead_of_spilling() {
        let alloc = allocator();
        for _ in 0..4 {
            alloc.alloc(8).unwrap();
        }

        let fault = alloc.alloc(8).unwrap_err();
        assert!(matches!(fault.kind(), FaultKind::PoolExhausted { .. }));
        assert_eq!(alloc.pools()[1].blocks_in_use(), 0);
    }

    #[test]
    fn pools_are_sorted_by_block_size() {
        let alloc = SizeClassAllocator::from_config(
            &AllocatorConfig::default()
                .class("large", 128, 1)
                .class("small", 16, 1),
        )
        .unwrap();

        assert_eq!(alloc.pools()[0].name(), "small");
        assert_eq!(alloc.max_request(), 128);
    }

    #[test]
    fn empty_configuration_is_rejected() {
        let result = SizeClassAllocator::from_config(&AllocatorConfig::default());
        assert!(matches!(result, Err(ConfigError::NoPools)));
    }

    #[test]
    fn client_pointers_are_block_aligned() {
        let alloc = allocator();
        let ptr = alloc.alloc(1).unwrap();
        assert_eq!(ptr.as_ptr() as usize % BLOCK_ALIGN, 0);
    }

    #[test]
    fn free_returns_block_to_owning_pool() {
        let alloc = allocator();
        let ptr = alloc.alloc(64).unwrap();
        assert_eq!(alloc.pools()[1].blocks_in_use(), 1);

        unsafe { alloc.free(Some(ptr)) };
        assert_eq!(alloc.pools()[1].blocks_in_use(), 0);
        assert_eq!(alloc.pools()[0].stats().deallocations, 0);
    }

    #[test]
    fn free_does_not_disturb_neighbours() {
        let alloc = allocator();
        let a = alloc.alloc(32).unwrap();
        let b = alloc.alloc(32).unwrap();
        let c = alloc.alloc(32).unwrap();
        fill(a, 32, 0x11);
        fill(b, 32, 0x22);
        fill(c, 32, 0x33);

        unsafe { alloc.free(Some(b)) };

        assert!(bytes(a, 32).iter().all(|&x| x == 0x11));
        assert!(bytes(c, 32).iter().all(|&x| x == 0x33));
        unsafe {
            assert_eq!(alloc.owning_pool(a).name(), "small");
            assert_eq!(alloc.owning_pool(c).name(), "small");
        }
    }

    #[test]
    fn usable_size_is_class_capacity() {
        let alloc = allocator();
        let ptr = alloc.alloc(3).unwrap();
        assert_eq!(unsafe { alloc.usable_size(ptr) }, 32);
    }

    #[test]
    fn calloc_zero_fills() {
        let alloc = allocator();
        let dirty = alloc.alloc(32).unwrap();
        fill(dirty, 32, 0xFF);
        unsafe { alloc.free(Some(dirty)) };

        let ptr = alloc.calloc(8, 4).unwrap();
        assert!(bytes(ptr, 32).iter().all(|&x| x == 0));
    }

    #[test]
    fn realloc_of_none_allocates() {
        let alloc = allocator();
        let ptr = unsafe { alloc.realloc(None, 20) }.unwrap();
        assert!(ptr.is_some());
        assert_eq!(alloc.pools()[0].blocks_in_use(), 1);
    }

    #[test]
    fn realloc_to_zero_frees() {
        let alloc = allocator();
        let ptr = alloc.alloc(20).unwrap();
        let result = unsafe { alloc.realloc(Some(ptr), 0) }.unwrap();

        assert!(result.is_none());
        assert_eq!(alloc.pools()[0].blocks_in_use(), 0);
    }

    #[test]
    fn realloc_grow_preserves_contents() {
        let alloc = allocator();
        let ptr = alloc.alloc(16).unwrap();
        for i in 0..16u8 {
            unsafe { ptr.as_ptr().add(i as usize).write(i) };
        }

        let grown = unsafe { alloc.realloc(Some(ptr), 100) }.unwrap().unwrap();

        assert_eq!(bytes(grown, 16), (0..16u8).collect::<Vec<_>>().as_slice());
        unsafe { assert_eq!(alloc.owning_pool(grown).name(), "large") };
        assert_eq!(alloc.pools()[0].blocks_in_use(), 0);
    }

    #[test]
    fn realloc_shrink_keeps_prefix() {
        let alloc = allocator();
        let ptr = alloc.alloc(120).unwrap();
        fill(ptr, 120, 0x7E);

        let shrunk = unsafe { alloc.realloc(Some(ptr), 8) }.unwrap().unwrap();

        assert!(bytes(shrunk, 8).iter().all(|&x| x == 0x7E));
        assert_eq!(alloc.pools()[1].blocks_in_use(), 0);
    }

    #[test]
    fn failed_realloc_keeps_old_block() {
        let alloc = allocator();
        let ptr = alloc.alloc(16).unwrap();
        fill(ptr, 16, 0x42);

        let fault = unsafe { alloc.realloc(Some(ptr), 500) }.unwrap_err();

        assert!(matches!(fault.kind(), FaultKind::NoSizeClass { .. }));
        assert!(bytes(ptr, 16).iter().all(|&x| x == 0x42));
        assert_eq!(alloc.pools()[0].blocks_in_use(), 1);
    }

    #[test]
    fn threads_share_one_allocator() {
        let alloc = SizeClassAllocator::from_config(
            &AllocatorConfig::default()
                .class("small", 32, 8)
                .class("large", 128, 8),
        )
        .unwrap();

        std::thread::scope(|scope| {
            for id in 0..4u8 {
                let alloc = &alloc;
                scope.spawn(move || {
                    for round in 0..500 {
                        let size = 8 + usize::from(id);
                        let small = alloc.alloc(size).unwrap();
                        fill(small, size, id);

                        let large = unsafe { alloc.realloc(Some(small), 100) }.unwrap().unwrap();
                        assert!(bytes(large, size).iter().all(|&b| b == id));
                        fill(large, 100, id ^ 0xFF);

                        let shrunk = unsafe { alloc.realloc(Some(large), 16) }.unwrap().unwrap();
                        assert!(bytes(shrunk, 16).iter().all(|&b| b == id ^ 0xFF), "round {round}");
                        unsafe { alloc.free(Some(shrunk)) };
                    }
                });
            }
        });

        let stats = alloc.stats();
        assert!(stats.iter().all(|s| s.blocks_in_use == 0));
        assert_eq!(stats[0].allocations, 4 * 1000);
        assert_eq!(stats[1].allocations, 4 * 500);
        assert!(stats.iter().all(|s| s.allocations == s.deallocations));
    }
}
