// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! Lifecycle and configuration services.
//!
//! A [`PortableContext`] represents "the bare-metal substrate is
//! active." The benchmark driver creates it with
//! [`init`](PortableContext::init) before any other substrate call and
//! clears it with [`fini`](PortableContext::fini) after the last one.
//! The driver owns the context's lifetime; the bracket requirement is a
//! driver contract, not a runtime-checked invariant.
//!
//! A [`Config`] gathers the values that select a run's behavior: the
//! pool capacity, the workload repeat count, and the [`SeedProfile`]
//! that resolves to the run's seed values. The configuration is
//! constructed once and consumed at initialization.
//!
//! # Example
//!
//! ```
//! use bedrock::portable::{Config, PortableContext, SeedProfile};
//!
//! let config = Config::validation(0x2_000, 10);
//! assert_eq!(config.seed_profile, SeedProfile::Validation);
//!
//! let mut context = PortableContext::init(&config);
//! assert!(context.is_active());
//! assert_eq!(context.seeds().seed1, 0x3415);
//!
//! context.fini();
//! assert!(!context.is_active());
//! ```

use crate::marker::NotSendOrSync;

/// The number of logical execution contexts the target provides.
///
/// The simulated environment is single-threaded; this is a fixed
/// constant, not a tunable.
pub const NUM_CONTEXTS: u32 = 1;

/// Selects the seed values for a run.
///
/// Validation runs use fixed seeds with a known result, performance
/// runs use zero seeds, and profiling runs use small stress seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SeedProfile {
    /// Deterministic seeds for result validation.
    Validation,
    /// Zero seeds for performance measurement.
    #[default]
    Performance,
    /// Stress seeds for profiling.
    Profiling,
}

/// The five seed values published to the benchmark.
///
/// Seeds 1 through 3 come from the [`SeedProfile`], seed 4 is the
/// iteration count, and seed 5 is reserved and always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeedValues {
    /// First workload seed.
    pub seed1: i32,
    /// Second workload seed.
    pub seed2: i32,
    /// Third workload seed.
    pub seed3: i32,
    /// The workload repeat count.
    pub seed4: i32,
    /// Reserved; always zero.
    pub seed5: i32,
}

impl SeedProfile {
    /// Resolve this profile into concrete seed values.
    #[allow(clippy::cast_possible_wrap)] // Iteration counts are small.
    pub const fn seeds(self, iterations: u32) -> SeedValues {
        let (seed1, seed2, seed3) = match self {
            SeedProfile::Validation => (0x3415, 0x3415, 0x66),
            SeedProfile::Performance => (0x0, 0x0, 0x66),
            SeedProfile::Profiling => (0x8, 0x8, 0x8),
        };
        SeedValues {
            seed1,
            seed2,
            seed3,
            seed4: iterations as i32,
            seed5: 0,
        }
    }
}

/// Configuration for a benchmark run.
///
/// Constructed once by the driver and passed to
/// [`PortableContext::init`]. These values select behavior; they are
/// not part of the runtime API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Total bump-pool capacity, in bytes.
    pub pool_size_bytes: usize,
    /// Workload repeat count.
    pub iterations: u32,
    /// Which seed values does the run use?
    pub seed_profile: SeedProfile,
}

impl Config {
    /// A validation-run configuration.
    pub const fn validation(pool_size_bytes: usize, iterations: u32) -> Self {
        Self {
            pool_size_bytes,
            iterations,
            seed_profile: SeedProfile::Validation,
        }
    }

    /// A performance-run configuration.
    pub const fn performance(pool_size_bytes: usize, iterations: u32) -> Self {
        Self {
            pool_size_bytes,
            iterations,
            seed_profile: SeedProfile::Performance,
        }
    }

    /// A profiling-run configuration.
    pub const fn profiling(pool_size_bytes: usize, iterations: u32) -> Self {
        Self {
            pool_size_bytes,
            iterations,
            seed_profile: SeedProfile::Profiling,
        }
    }

    /// Resolve the run's seed values.
    pub const fn seeds(&self) -> SeedValues {
        self.seed_profile.seeds(self.iterations)
    }
}

/// The lifecycle handle representing an active substrate.
///
/// The context is a small tag object: an identity flag distinguishing
/// the initialized from the finalized state, plus the seed values the
/// run publishes to the benchmark. It's bound to the single execution
/// context of the target, so it is neither `Send` nor `Sync`.
pub struct PortableContext {
    active: bool,
    seeds: SeedValues,
    _not_send_or_sync: NotSendOrSync,
}

impl PortableContext {
    /// Establish the portable context.
    ///
    /// Must be called before any other substrate use for the run this
    /// context brackets.
    pub fn init(config: &Config) -> Self {
        Self {
            active: true,
            seeds: config.seeds(),
            _not_send_or_sync: NotSendOrSync::mark(),
        }
    }

    /// Returns `true` if the context is initialized and not yet
    /// finalized.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The seed values published for this run.
    #[inline]
    pub fn seeds(&self) -> SeedValues {
        self.seeds
    }

    /// Tear down the portable context.
    ///
    /// Clears the identity flag. All substrate use for the run must
    /// precede this call.
    pub fn fini(&mut self) {
        self.active = false;
    }
}
