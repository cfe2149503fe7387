//! Event payload storage.
//!
//! [`EventPayloadAllocator`] is a size-class allocator with a fixed small/large
//! layout. It is the only allocation surface the engine uses for event data,
//! so dispatching never touches the global heap.
//!
//! [`Payload<T>`] is the typed owning handle the engine consumes: it places a
//! value inside a pool block and returns the block when dropped.

use super::config::AllocatorConfig;
use super::error::ConfigError;
use super::pool::{PoolStats, BLOCK_ALIGN};
use super::size_class::SizeClassAllocator;
use crate::fault::{Fault, FaultKind, FaultResult};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// Payload capacity of the small class.
pub const SMALL_CAPACITY: usize = 32;
/// Blocks in the small class.
pub const SMALL_BLOCKS: usize = 10;
/// Payload capacity of the large class.
pub const LARGE_CAPACITY: usize = 128;
/// Blocks in the large class.
pub const LARGE_BLOCKS: usize = 5;

/// Shared handle to the payload pools. Cloning shares the same pools.
#[derive(Clone, Debug)]
pub struct EventPayloadAllocator {
    inner: Arc<SizeClassAllocator>,
}

impl EventPayloadAllocator {
    /// The standard layout: 10 blocks of 32 bytes and 5 blocks of 128 bytes.
    pub fn default_config() -> AllocatorConfig {
        AllocatorConfig::default()
            .class("payload-small", SMALL_CAPACITY, SMALL_BLOCKS)
            .class("payload-large", LARGE_CAPACITY, LARGE_BLOCKS)
    }

    /// Build the pools with [`default_config`](Self::default_config).
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(&Self::default_config())
    }

    pub fn with_config(config: &AllocatorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Arc::new(SizeClassAllocator::from_config(config)?),
        })
    }

    /// The underlying size-class allocator.
    pub fn allocator(&self) -> &SizeClassAllocator {
        &self.inner
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.inner.stats()
    }

    /// Move `value` into a pool block.
    ///
    /// Faults if `T` needs stricter alignment than a block provides, if it
    /// fits no class, or if its class is exhausted.
    #[track_caller]
    pub fn payload<T>(&self, value: T) -> FaultResult<Payload<T>> {
        if mem::align_of::<T>() > BLOCK_ALIGN {
            return Err(Fault::raise(FaultKind::UnsupportedAlignment {
                align: mem::align_of::<T>(),
                supported: BLOCK_ALIGN,
            }));
        }

        let ptr = self.inner.alloc(mem::size_of::<T>())?.cast::<T>();
        // SAFETY: the region is at least size_of::<T>() bytes and aligned to
        // BLOCK_ALIGN, which was checked to satisfy T.
        unsafe { ptr.as_ptr().write(value) };

        Ok(Payload {
            ptr,
            allocator: Arc::clone(&self.inner),
            _owns: PhantomData,
        })
    }

    /// Raw allocation, see [`SizeClassAllocator::alloc`].
    #[track_caller]
    pub fn alloc(&self, size: usize) -> FaultResult<NonNull<u8>> {
        self.inner.alloc(size)
    }

    /// Raw zeroed allocation, see [`SizeClassAllocator::calloc`].
    #[track_caller]
    pub fn calloc(&self, num: usize, size: usize) -> FaultResult<NonNull<u8>> {
        self.inner.calloc(num, size)
    }

    /// # Safety
    ///
    /// See [`SizeClassAllocator::free`].
    pub unsafe fn free(&self, ptr: Option<NonNull<u8>>) {
        self.inner.free(ptr)
    }

    /// # Safety
    ///
    /// See [`SizeClassAllocator::realloc`].
    #[track_caller]
    pub unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
    ) -> FaultResult<Option<NonNull<u8>>> {
        self.inner.realloc(ptr, new_size)
    }
}

/// A value living in a payload pool block.
///
/// Dropping the handle drops the value and frees the block.
pub struct Payload<T> {
    ptr: NonNull<T>,
    allocator: Arc<SizeClassAllocator>,
    _owns: PhantomData<T>,
}

// SAFETY: the handle uniquely owns its value; the allocator is Sync.
unsafe impl<T: Send> Send for Payload<T> {}
unsafe impl<T: Sync> Sync for Payload<T> {}

impl<T> Payload<T> {
    /// Move the value out and free the block.
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the value and the allocator
        // handle are each read out exactly once.
        unsafe {
            let value = this.ptr.as_ptr().read();
            let allocator = ptr::read(&this.allocator);
            allocator.free(Some(this.ptr.cast()));
            value
        }
    }

    /// Client bytes available in the backing block.
    pub fn capacity(&self) -> usize {
        // SAFETY: the block is live for as long as the handle exists.
        unsafe { self.allocator.usable_size(self.ptr.cast()) }
    }

    /// Name of the pool holding the value.
    pub fn pool_name(&self) -> &str {
        // SAFETY: as above.
        unsafe { self.allocator.owning_pool(self.ptr.cast()).name() }
    }
}

impl<T> Deref for Payload<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: initialized in `payload` and uniquely owned.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for Payload<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above; `&mut self` guarantees exclusivity.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for Payload<T> {
    fn drop(&mut self) {
        // SAFETY: the value is initialized and the block still belongs to
        // this handle.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.allocator.free(Some(self.ptr.cast()));
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Payload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&**self).finish()
    }
}
