// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! A Bedrock global allocator, using a bump pool.
//!
//! Use [`initialize`] to provide the global allocator with a memory
//! allocation. Once initialized, `alloc` hands out aligned,
//! never-reclaimed blocks from the pool, and `dealloc` is the
//! substrate's documented no-op: released blocks never become reusable.
//!
//! The package registers the global allocator for only those targets
//! that require it.
//!
//! Re-invoking [`initialize`] installs a fresh pool and abandons every
//! block handed out by the previous one. That matches the substrate's
//! single-run model; it is not a general reset facility.
//!
//! # Panics
//!
//! Your program panics if it tries to allocate before [`initialize`]
//! is called.
//!
//! # Examples
//!
//! ```no_run
//! # fn storage() -> &'static mut [u8] { unimplemented!() }
//! let storage = storage();
//! unsafe {
//!     bedrock_allocator::initialize(storage.as_mut_ptr(), storage.len()).unwrap();
//! }
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

use core::alloc::{GlobalAlloc, Layout};
use core::cell::RefCell;

use bedrock::bump_pool::{BumpPool, BumpPoolOptions};
pub use bedrock::bump_pool::{CreateError, PoolInfo as AllocatorInfo};
use critical_section::Mutex;

struct PoolSlot(RefCell<Option<BumpPool<'static>>>);

// Safety: the slot is only reached through the critical-section mutex,
// so at most one execution context touches the pool at a time.
unsafe impl Send for PoolSlot {}

static POOL: Mutex<PoolSlot> = Mutex::new(PoolSlot(RefCell::new(None)));

#[cfg_attr(all(target_arch = "arm", target_os = "none"), global_allocator)]
#[unsafe(no_mangle)]
static GLOBAL_ALLOCATOR: BumpPoolAllocator = BumpPoolAllocator;

struct BumpPoolAllocator;

/// Initialize the allocator.
///
/// On success, the global allocator serves allocations from the given
/// storage. Calling this again replaces the pool, invalidating every
/// previously returned block.
///
/// See [the module-level documentation](crate) for an example.
///
/// # Safety
///
/// The allocator's storage must outlive the allocator. The memory for
/// the allocator must not be used for anything else.
#[inline]
pub unsafe fn initialize(start: *mut u8, len: usize) -> Result<(), CreateError> {
    let mut opts = BumpPoolOptions::default();
    opts.name = Some("global-allocator");

    // Safety: the caller guarantees the storage is valid for the life
    // of the allocator and exclusively ours.
    let pool = unsafe { BumpPool::create_unchecked(start, len, &opts) }?;

    critical_section::with(|cs| {
        POOL.borrow(cs).0.replace(Some(pool));
    });
    Ok(())
}

/// Retrieve runtime information regarding the allocator.
///
/// # Panics
///
/// Panics if the allocator hasn't been initialized.
pub fn info() -> AllocatorInfo<'static> {
    critical_section::with(|cs| {
        POOL.borrow(cs)
            .0
            .borrow()
            .as_ref()
            .map(BumpPool::info)
            .unwrap()
    })
}

unsafe impl GlobalAlloc for BumpPoolAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        critical_section::with(|cs| {
            let slot = POOL.borrow(cs).0.borrow();
            let pool = slot.as_ref().unwrap();

            // The pool hands out regions at exact byte offsets, so
            // over-allocate and round the block start up to alignment.
            // Nothing is ever released, so no back-pointer is stored.
            let Some(padded) = layout.size().checked_add(layout.align() - 1) else {
                return core::ptr::null_mut();
            };
            let Some(mut region) = pool.allocate(padded) else {
                return core::ptr::null_mut();
            };

            let ptr = region.as_mut_ptr();
            let offset = ptr.align_offset(layout.align());
            // Safety: offset < align, so offset + size <= padded and
            // the aligned block stays inside the region.
            unsafe { ptr.add(offset) }
        })
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {
        // The bump pool never reclaims memory.
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::{GlobalAlloc, Layout};

    use bedrock::bump_pool::StaticPoolStorage;

    static STORAGE: StaticPoolStorage<4096> = StaticPoolStorage::new();

    #[test]
    fn allocate_aligned_blocks_and_never_reclaim() {
        let storage = STORAGE.take().unwrap();
        unsafe { super::initialize(storage.as_mut_ptr(), storage.len()) }.unwrap();

        let layout = Layout::from_size_align(37, 64).unwrap();

        let first = unsafe { super::GLOBAL_ALLOCATOR.alloc(layout) };
        assert!(!first.is_null());
        assert_eq!(first as usize % 64, 0);

        let second = unsafe { super::GLOBAL_ALLOCATOR.alloc(layout) };
        assert!(!second.is_null());
        assert_eq!(second as usize % 64, 0);
        assert!(second as usize >= first as usize + 37);

        let used_before = super::info().used;
        unsafe { super::GLOBAL_ALLOCATOR.dealloc(first, layout) };
        assert_eq!(super::info().used, used_before);

        // Exhaust the pool; the failure is a null block.
        let huge = Layout::from_size_align(8192, 8).unwrap();
        let exhausted = unsafe { super::GLOBAL_ALLOCATOR.alloc(huge) };
        assert!(exhausted.is_null());
    }
}
