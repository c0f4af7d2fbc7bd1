// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! Bump pool services.
//!
//! A [`BumpPool`] is a single-shot memory allocator. The pool manages a
//! fixed byte storage region that you allocate, and it hands out
//! non-overlapping regions by advancing a cursor through that storage.
//! Nothing is ever reclaimed: [`release`] is a guaranteed no-op, kept
//! only so allocator-consuming code has the entry point it expects.
//!
//! This model fits a benchmark that runs exactly once to completion
//! with a statically known memory footprint. Free-list management would
//! add failure surface (fragmentation, double-free) with zero benefit
//! in a single-shot, non-reentrant execution model.
//!
//! The pool exclusively borrows its storage. Creating a fresh pool over
//! the same storage is how a driver "re-initializes" the allocator, and
//! the borrow checker guarantees that regions from the previous pool
//! are gone before the new pool can exist.
//!
//! # Examples
//!
//! A pool over static storage:
//!
//! ```
//! use bedrock::bump_pool::{BumpPool, StaticPoolStorage};
//!
//! static STORAGE: StaticPoolStorage<1024> = StaticPoolStorage::new();
//!
//! let storage = STORAGE.take().unwrap();
//! let pool = BumpPool::create(storage, &Default::default()).unwrap();
//!
//! let region = pool.allocate(96).unwrap();
//! assert_eq!(region.len(), 96);
//! ```
//!
//! A pool over local storage. Successive allocations are adjacent, and
//! exhaustion is signalled as `None` with the cursor left untouched:
//!
//! ```
//! use bedrock::bump_pool::{AlignedPoolStorage, BumpPool};
//!
//! let mut storage = AlignedPoolStorage::from_array([0u8; 512]);
//! let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();
//!
//! let first = pool.allocate(10).unwrap();
//! let second = pool.allocate(10).unwrap();
//! assert_eq!(first.as_ptr() as usize + 10, second.as_ptr() as usize);
//!
//! assert!(pool.allocate(pool.remaining() + 1).is_none());
//! assert_eq!(pool.used(), 20);
//! ```

use core::cell::Cell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::marker::CovariantLifetime;
use crate::StaticCell;

/// An error when creating a bump pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CreateError {
    /// The storage's starting address is invalid.
    ///
    /// The pointer cannot be null.
    InvalidPointer,

    /// The storage's size is invalid.
    ///
    /// The size cannot be zero.
    InvalidSize,
}

/// Helps you meet alignment expectations for pool storage.
///
/// The pool itself hands out regions at exact byte offsets, but drivers
/// conventionally size and align the backing storage for the widest
/// type the workload stores. This adapter aligns your storage
/// allocation `S` to an eight-byte boundary. Use
/// [`from_array`](Self::from_array) to specify the starting value for
/// your pool's storage.
#[repr(C, align(8))]
#[derive(Clone, Copy)]
pub struct AlignedPoolStorage<S>(S);

impl<const N: usize> AlignedPoolStorage<[u8; N]> {
    /// Allocate a byte array aligned for pool storage.
    #[inline]
    pub const fn from_array(array: [u8; N]) -> Self {
        Self(array)
    }
}

impl<S> AlignedPoolStorage<S> {
    /// Borrow the storage.
    #[inline]
    pub fn get(&self) -> &S {
        &self.0
    }
    /// Exclusively borrow the storage.
    #[inline]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S> AsRef<[u8]> for AlignedPoolStorage<S>
where
    S: AsRef<[u8]>,
{
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<S> AsMut<[u8]> for AlignedPoolStorage<S>
where
    S: AsMut<[u8]>,
{
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        self.0.as_mut()
    }
}

/// Statically allocate `N` bytes for a bump pool.
///
/// This manages a static storage allocation of `N` bytes. It also
/// manages a "taken" flag used to track ownership. Use
/// [`take`](Self::take) to acquire the storage.
///
/// If the allocation is zero bytes large, then this fails to compile.
///
/// # Example
///
/// ```
/// use bedrock::bump_pool::StaticPoolStorage;
///
/// static STORAGE: StaticPoolStorage<2048> = StaticPoolStorage::new();
///
/// let storage = STORAGE.take().unwrap();
/// assert!(STORAGE.take().is_none());
/// ```
pub struct StaticPoolStorage<const N: usize>(StaticCell<AlignedPoolStorage<[u8; N]>>);

impl<const N: usize> Default for StaticPoolStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StaticPoolStorage<N> {
    const SIZE_IS_VALID: () = assert!(N > 0);

    /// Allocate the storage.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)] // Force const evaluation.
        {
            let _ = Self::SIZE_IS_VALID;
        }
        Self(StaticCell::new(AlignedPoolStorage::from_array([0; N])))
    }

    /// Take a static, mutable reference to this storage.
    ///
    /// If the storage has already been taken, then this returns `None`.
    /// Otherwise, you can use this to create a [`BumpPool`].
    ///
    /// The implementation uses a brief critical section to swap a
    /// `bool`.
    pub fn take(&'static self) -> Option<&'static mut [u8]> {
        self.0.take().map(AsMut::as_mut)
    }
}

/// Options for a bump pool.
#[derive(Default)]
#[non_exhaustive]
pub struct BumpPoolOptions<'ctx> {
    /// The pool's diagnostic name.
    pub name: Option<&'ctx str>,
}

/// A single-shot bump allocator over a fixed storage region.
///
/// The pool exclusively borrows the storage provided to
/// [`create`](Self::create); no other component may address that
/// storage while the pool is alive. You interact with allocated memory
/// through [`Region`] handles.
///
/// The allocation cursor only moves forward. The cursor invariant,
/// `0 <= cursor <= capacity`, holds at all times; a request that would
/// push the cursor past the capacity fails without consuming anything.
///
/// The pool is not `Sync`: the simulated target provides one execution
/// context, so cursor updates need no synchronization. A multi-context
/// port would replace the cursor with an atomic compare-and-advance.
pub struct BumpPool<'ctx> {
    start: NonNull<u8>,
    capacity: usize,
    cursor: Cell<usize>,
    name: Option<&'ctx str>,
    _storage: PhantomData<&'ctx mut [u8]>,
}

impl<'ctx> BumpPool<'ctx> {
    /// Create a bump pool that uses `storage` as its storage allocation.
    ///
    /// The cursor starts at zero. `storage` is exclusively borrowed for
    /// the lifetime of the pool.
    pub fn create<S>(
        storage: &'ctx mut S,
        opts: &'_ BumpPoolOptions<'ctx>,
    ) -> Result<Self, CreateError>
    where
        S: AsMut<[u8]> + ?Sized,
    {
        // Safety: Since we have an exclusive borrow of the storage for
        // 'ctx, we satisfy create_unchecked's safety requirement.
        unsafe {
            let storage = storage.as_mut();
            let storage_len = storage.len();
            let storage_ptr = storage.as_mut_ptr();
            Self::create_unchecked(storage_ptr, storage_len, opts)
        }
    }

    /// Create a bump pool using an external storage allocation.
    ///
    /// Unlike [`create`](Self::create), this method doesn't know the
    /// lifetime of the storage allocation.
    ///
    /// # Safety
    ///
    /// The storage described by the pointer-length pair must remain
    /// valid for the life of the pool. The caller must ensure that the
    /// storage is exclusively borrowed by the pool.
    pub unsafe fn create_unchecked(
        storage_ptr: *mut u8,
        storage_len: usize,
        opts: &'_ BumpPoolOptions<'ctx>,
    ) -> Result<Self, CreateError> {
        let Some(start) = NonNull::new(storage_ptr) else {
            return Err(CreateError::InvalidPointer);
        };
        if storage_len == 0 {
            return Err(CreateError::InvalidSize);
        }
        Ok(Self {
            start,
            capacity: storage_len,
            cursor: Cell::new(0),
            name: opts.name,
            _storage: PhantomData,
        })
    }

    /// Allocate `size` bytes from the pool.
    ///
    /// On success, the returned region starts exactly where the
    /// previous allocation ended, and it's disjoint from every
    /// previously returned region. Zero-size requests succeed with an
    /// empty region.
    ///
    /// If the request would overflow the pool, the return is `None`
    /// and the cursor is left unchanged. There is no fallback
    /// allocation path; the driver must treat `None` as fatal for the
    /// benchmark run.
    pub fn allocate(&self, size: usize) -> Option<Region<'_>> {
        let cursor = self.cursor.get();
        let end = cursor.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.cursor.set(end);

        // Safety: The cursor invariant keeps `cursor + size` within
        // the storage allocation, so the offset stays in bounds (or
        // one past the end for an empty region at capacity). The
        // advancing cursor makes this span disjoint from every region
        // returned earlier.
        let ptr = unsafe { NonNull::new_unchecked(self.start.as_ptr().add(cursor)) };
        Some(Region {
            ptr,
            len: size,
            lifetime: CovariantLifetime::mark(),
        })
    }

    /// How many bytes has the pool handed out?
    #[inline]
    pub fn used(&self) -> usize {
        self.cursor.get()
    }

    /// How many bytes remain allocatable?
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor.get()
    }

    /// The total size of the storage allocation, in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquire runtime pool information.
    pub fn info(&self) -> PoolInfo<'ctx> {
        PoolInfo {
            name: self.name,
            capacity: self.capacity,
            used: self.used(),
            remaining: self.remaining(),
        }
    }
}

/// Release a region back to the pool.
///
/// This is a guaranteed no-op. It performs no bookkeeping and never
/// makes the region's memory reusable; it exists so code written
/// against a conventional allocator interface keeps its release call
/// sites. Test suites may assert the no-op contract by observing that
/// [`BumpPool::used`] is unchanged afterwards.
#[inline]
pub fn release(region: Region<'_>) {
    let _ = region;
}

/// Information about a bump pool.
///
/// Use [`BumpPool::info`] to query this information.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct PoolInfo<'pool> {
    /// What's this pool's name?
    pub name: Option<&'pool str>,
    /// The total size of the storage allocation.
    pub capacity: usize,
    /// How many bytes have been handed out?
    pub used: usize,
    /// How many bytes remain allocatable?
    pub remaining: usize,
}

/// A span of bytes allocated from a [`BumpPool`].
///
/// `Region` provides exclusive ownership of its span. It dereferences
/// to `[u8]`, and it carries the pool's lifetime so it cannot outlive
/// the storage it points into.
///
/// Dropping a region does not return its memory to the pool; nothing
/// does. Pass it to [`release`] if the surrounding code expects a
/// release call site.
pub struct Region<'pool> {
    ptr: NonNull<u8>,
    len: usize,
    #[allow(dead_code)] // Tracks the pool borrow.
    lifetime: CovariantLifetime<'pool>,
}

// Safety: the region exclusively owns its bytes, and bytes can move
// across execution contexts. The inner lifetime prevents a sent region
// from outliving its pool.
unsafe impl Send for Region<'_> {}
// Safety: sharing a region only permits reads of its bytes. The inner
// lifetime restricts how long that borrow can last.
unsafe impl Sync for Region<'_> {}

impl Region<'_> {
    /// The starting address of the region.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// The starting address of the region, valid for writes.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Deref for Region<'_> {
    type Target = [u8];
    #[inline]
    fn deref(&self) -> &Self::Target {
        // Safety: the region exclusively owns `len` bytes starting at
        // `ptr`, and the lifetime ties that span to the live pool
        // storage.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for Region<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: same as Deref, and the exclusive receiver guarantees
        // no other reference into this span exists.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}
