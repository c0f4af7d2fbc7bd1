// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! Bedrock is a bare-metal execution substrate for benchmark workloads.
//!
//! Bedrock lets an OS-agnostic benchmark suite run on a simulated target
//! that has no operating system, no C library, and no wall-clock timer.
//! It provides the three services such a suite depends on:
//!
//! - a deterministic, tick-based timer ([`timer`]),
//! - a single-shot bump allocator over a fixed storage region
//!   ([`bump_pool`]),
//! - the byte-wise memory primitives benchmark inner loops assume
//!   ([`mem`]).
//!
//! A [`PortableContext`] brackets all other substrate use, and
//! [`output`] supplies the formatted-output entry point that the driver
//! expects to exist. That entry point deliberately produces no output;
//! the suite validates by instruction count, not by text.
//!
//! # Getting started
//!
//! The benchmark driver owns every piece of state. It builds a
//! [`Config`], activates a [`PortableContext`], creates its pool and
//! clock, and runs the workload to completion:
//!
//! ```
//! use bedrock::bump_pool::{AlignedPoolStorage, BumpPool};
//! use bedrock::timer::{LogicalClock, Stopwatch};
//! use bedrock::{Config, PortableContext};
//!
//! let config = Config::validation(256, 10);
//! let mut context = PortableContext::init(&config);
//!
//! let mut storage = AlignedPoolStorage::from_array([0u8; 256]);
//! let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();
//!
//! let mut clock = LogicalClock::new();
//! let mut stopwatch = Stopwatch::new();
//!
//! stopwatch.start(&mut clock).unwrap();
//! let region = pool.allocate(64).unwrap();
//! // ... the workload touches `region` here ...
//! stopwatch.stop(&mut clock).unwrap();
//!
//! assert_eq!(stopwatch.elapsed().unwrap(), 1);
//! assert_eq!(region.len(), 64);
//!
//! context.fini();
//! assert!(!context.is_active());
//! ```
//!
//! # Design
//!
//! Bedrock services follow a consistent API design.
//!
//! ## State is explicit
//!
//! There is no hidden process-wide state. The tick counter lives in a
//! [`LogicalClock`](timer::LogicalClock) value, the allocation cursor
//! lives in a [`BumpPool`](bump_pool::BumpPool), and the lifecycle flag
//! lives in a [`PortableContext`]. The driver can therefore instantiate
//! multiple independent substrates, which is how the unit tests exercise
//! the package.
//!
//! ## Exhaustion is not an error
//!
//! A bump pool that runs out of memory is doing what a fixed pool
//! does, so
//! [`allocate`](bump_pool::BumpPool::allocate) signals exhaustion as
//! `None` in the success path rather than through an error enum. There
//! is no fallback allocation path; the driver must treat `None` as fatal
//! for the run. Conditions that indicate a misused API, like stopping a
//! stopwatch that never started, are errors.
//!
//! ## Single execution context
//!
//! The simulated target provides exactly one logical execution context
//! ([`portable::NUM_CONTEXTS`]). Nothing blocks, suspends, or yields,
//! and the types that hold mutable substrate state are not `Sync`. A
//! future multi-context port would need to replace the pool cursor with
//! an atomic compare-and-advance; nothing else in the contract changes.
//!
//! # Porting
//!
//! The logical clock advances by one tick per read, which validates that
//! a workload executed but says nothing about real performance. A host
//! that wants real timing implements [`TickSource`](timer::TickSource)
//! over its cycle counter and hands that source to the same
//! [`Stopwatch`](timer::Stopwatch); the start/stop/elapsed contract is
//! unchanged.

#![no_std]
#![warn(
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    let_underscore_drop,
    missing_docs,
    semicolon_in_expressions_from_macros,
    trivial_numeric_casts,
    unsafe_op_in_unsafe_fn,
    unreachable_pub,
    unused_qualifications,
    clippy::cast_possible_truncation,
    clippy::map_unwrap_or,
    clippy::manual_assert,
    clippy::missing_safety_doc,
    clippy::ref_as_ptr,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::single_match_else,
    clippy::undocumented_unsafe_blocks,
    clippy::used_underscore_binding
)]
#![allow(
    missing_debug_implementations,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

#[cfg(test)]
extern crate std;

use core::cell::UnsafeCell;

pub mod bump_pool;
pub mod mem;
pub mod output;
pub mod portable;
pub mod timer;

pub use portable::{Config, PortableContext, SeedProfile};

mod marker {
    use core::marker::PhantomData;

    /// A zero-sized type that's neither `Send` nor `Sync`.
    ///
    /// Use this marker when you have no other way to mark `!Send` or
    /// `!Sync` for your type. This type is valid to construct in a
    /// const context.
    pub(crate) struct NotSendOrSync(PhantomData<*mut ()>);
    impl NotSendOrSync {
        pub(crate) const fn mark() -> Self {
            Self(PhantomData)
        }
    }

    /// A zero-sized type that allows covariance up to `'wat`.
    ///
    /// This type still implements Send and Sync. If you need to block
    /// those implementations, seek another marker type.
    ///
    /// This type can be constructed in a const context.
    pub(crate) struct CovariantLifetime<'wat> {
        covariant_lifetime: PhantomData<&'wat ()>,
    }

    impl CovariantLifetime<'_> {
        pub(crate) const fn mark() -> Self {
            Self {
                covariant_lifetime: PhantomData,
            }
        }
    }
}

/// A cell that can be manipulated within a critical section.
///
/// Since `T: Copy`, this cell has no drop behavior. Since it
/// has no drop behavior, we're in full control of the code that
/// executes within the critical section.
#[repr(transparent)]
struct InterruptFreeCell<T: Copy>(core::cell::Cell<T>);

// Safety: as long as we can send the data across execution contexts,
// the critical section will protect access to the data.
unsafe impl<T: Copy + Send> Sync for InterruptFreeCell<T> {}

impl<T: Copy> InterruptFreeCell<T> {
    /// Allocate a cell with an initial value.
    const fn new(value: T) -> Self {
        Self(core::cell::Cell::new(value))
    }
    /// Replace the contents of the cell with a new value.
    ///
    /// No drop / foreign code runs.
    fn replace(&self, val: T) -> T {
        critical_section::with(|_| self.0.replace(val))
    }
}

struct StaticCell<T> {
    data: UnsafeCell<T>,
    taken: InterruptFreeCell<bool>,
}

// Safety: We guard access to the data with a runtime flag. The
// flag guarantees that only one execution context can access
// the managed data.
unsafe impl<T: Send> Sync for StaticCell<T> {}

impl<T> StaticCell<T> {
    const fn new(value: T) -> Self {
        Self {
            data: UnsafeCell::new(value),
            taken: InterruptFreeCell::new(false),
        }
    }

    /// Take a mutable reference to this cell's data.
    ///
    /// Returns `Some(...)` for the first call, then `None` on
    /// any subsequent call.
    fn take(&'static self) -> Option<&'static mut T> {
        // Safety: The flag replacement happens in a critical section.
        // The flag ensures that there is only one mutable reference
        // acquired from this call.
        unsafe {
            let already_taken = self.taken.replace(true);
            if already_taken {
                None
            } else {
                Some(&mut *self.data.get())
            }
        }
    }
}
