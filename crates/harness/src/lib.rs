// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! A portable benchmark driver for exercising the Bedrock substrate.
//!
//! The harness plays the role of the external benchmark suite: it
//! touches the substrate only through its fixed interface. A run
//! establishes the portable context, creates a bump pool over
//! caller-provided storage, brackets a deterministic workload with
//! stopwatch snapshots, converts the elapsed ticks into reporting
//! units, and tears the context down.
//!
//! ```
//! use bedrock::Config;
//!
//! let config = Config::validation(512, 10);
//! let mut storage = [0u8; 512];
//!
//! let report = bedrock_harness::run(&config, &mut storage).unwrap();
//! assert_eq!(report.iterations, 10);
//! ```
//!
//! # Theory of operation
//!
//! The workload allocates two scratch buffers from the pool, then
//! repeatedly fills the first with a pseudo-random pattern, copies it
//! into the second, and verifies the copy with a byte compare. Each
//! iteration then perturbs one byte and confirms that the compare
//! reports the mismatch. The byte-level results fold into a checksum,
//! so two runs with the same configuration always produce the same
//! report. Seeds come from the run's [`SeedProfile`][bedrock::SeedProfile].
//!
//! The workload consumes one heartbeat tick per iteration, so the
//! elapsed tick count grows with the iteration count.
//!
//! With the `defmt` feature enabled, the harness reveals its report
//! through `defmt`; you must include a defmt global logger to see it.

#![no_std]

#[cfg(test)]
extern crate std;

use bedrock::bump_pool::{BumpPool, BumpPoolOptions};
use bedrock::portable::SeedValues;
use bedrock::timer::{self, LogicalClock, Stopwatch, TickSource};
use bedrock::{mem, Config, PortableContext};

/// The size of each scratch buffer, in bytes.
pub const WORK_BUFFER_LEN: usize = 128;

/// The result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunReport {
    /// Ticks elapsed between the start and stop snapshots.
    pub elapsed_ticks: u32,
    /// The elapsed ticks converted into the reporting unit.
    pub reporting_units: u32,
    /// Folded workload results; identical configurations produce
    /// identical checksums.
    pub checksum: u32,
    /// How many workload iterations ran.
    pub iterations: u32,
}

/// An error that ends a run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    /// The pool could not satisfy the workload's memory footprint.
    ///
    /// There is no fallback allocation path; the run is abandoned.
    OutOfMemory,
    /// The workload's self-check failed.
    Validation,
}

/// Run the workload described by `config` over `storage`.
///
/// `storage` backs the bump pool; it must hold at least
/// `config.pool_size_bytes` bytes, and the pool must cover two
/// [`WORK_BUFFER_LEN`] scratch buffers.
pub fn run(config: &Config, storage: &mut [u8]) -> Result<RunReport, RunError> {
    let mut context = PortableContext::init(config);

    bedrock::diag!("run: {} iterations", config.iterations);

    let pool_storage = storage
        .get_mut(..config.pool_size_bytes)
        .ok_or(RunError::OutOfMemory)?;
    let pool = BumpPool::create(pool_storage, &{
        let mut opts = BumpPoolOptions::default();
        opts.name = Some("harness");
        opts
    })
    .map_err(|_| RunError::OutOfMemory)?;

    let mut scratch_a = pool.allocate(WORK_BUFFER_LEN).ok_or(RunError::OutOfMemory)?;
    let mut scratch_b = pool.allocate(WORK_BUFFER_LEN).ok_or(RunError::OutOfMemory)?;

    let mut state = mix_seeds(&context.seeds());
    let mut checksum = 0u32;

    let mut clock = LogicalClock::new();
    let mut stopwatch = Stopwatch::new();
    stopwatch.start(&mut clock).unwrap();

    for _ in 0..config.iterations {
        // One heartbeat tick per iteration.
        clock.read_tick();

        state = xorshift(state);

        // Safety: both scratch regions are valid for WORK_BUFFER_LEN
        // bytes, and the pool guarantees they're disjoint.
        let diff = unsafe {
            mem::fill(scratch_a.as_mut_ptr(), state, WORK_BUFFER_LEN);
            mem::copy(scratch_b.as_mut_ptr(), scratch_a.as_ptr(), WORK_BUFFER_LEN);
            if mem::compare(scratch_a.as_ptr(), scratch_b.as_ptr(), WORK_BUFFER_LEN) != 0 {
                return Err(RunError::Validation);
            }

            // Perturb the final byte; the compare must see it.
            mem::fill(
                scratch_b.as_mut_ptr().add(WORK_BUFFER_LEN - 1),
                state ^ 0xFF,
                1,
            );
            mem::compare(scratch_a.as_ptr(), scratch_b.as_ptr(), WORK_BUFFER_LEN)
        };
        if diff == 0 {
            return Err(RunError::Validation);
        }

        checksum = checksum.rotate_left(5) ^ (diff as u32) ^ state;
    }

    stopwatch.stop(&mut clock).unwrap();
    let elapsed = stopwatch.elapsed().unwrap();
    let units = timer::ticks_to_unit(elapsed);

    bedrock::diag!("run complete: {} ticks", elapsed);
    #[cfg(feature = "defmt")]
    defmt::info!(
        "workload complete: ticks={=u32} units={=u32} checksum={=u32:08x}",
        elapsed,
        units,
        checksum
    );

    context.fini();

    Ok(RunReport {
        elapsed_ticks: elapsed,
        reporting_units: units,
        checksum,
        iterations: config.iterations,
    })
}

/// Fold the published seeds into a non-zero generator state.
fn mix_seeds(seeds: &SeedValues) -> u32 {
    let s1 = seeds.seed1 as u32;
    let s2 = seeds.seed2 as u32;
    let s3 = seeds.seed3 as u32;
    (s1 ^ (s2 << 8) ^ (s3 << 16)) | 1
}

/// One step of a 32-bit xorshift generator.
fn xorshift(mut state: u32) -> u32 {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
}

#[cfg(test)]
mod tests {
    use bedrock::Config;

    use super::{run, RunError, WORK_BUFFER_LEN};

    #[test]
    fn identical_configs_produce_identical_reports() {
        let config = Config::validation(512, 25);
        let mut first_storage = [0u8; 512];
        let mut second_storage = [0u8; 512];

        let first = run(&config, &mut first_storage).unwrap();
        let second = run(&config, &mut second_storage).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn elapsed_ticks_track_iterations() {
        let config = Config::performance(512, 10);
        let mut storage = [0u8; 512];

        let report = run(&config, &mut storage).unwrap();
        // One tick for the start snapshot, one heartbeat per iteration.
        assert_eq!(report.elapsed_ticks, 11);
        assert_eq!(report.reporting_units, 0);
    }

    #[test]
    fn profiles_diverge() {
        let mut storage = [0u8; 512];
        let validation = run(&Config::validation(512, 5), &mut storage).unwrap();
        let profiling = run(&Config::profiling(512, 5), &mut storage).unwrap();
        assert_ne!(validation.checksum, profiling.checksum);
    }

    #[test]
    fn undersized_pool_is_fatal() {
        // Room for one scratch buffer, not two.
        let mut storage = [0u8; WORK_BUFFER_LEN + 16];
        let result = run(&Config::performance(WORK_BUFFER_LEN + 16, 3), &mut storage);
        assert_eq!(result, Err(RunError::OutOfMemory));
    }

    #[test]
    fn storage_shorter_than_configured_pool_is_fatal() {
        let mut storage = [0u8; 64];
        let result = run(&Config::performance(512, 3), &mut storage);
        assert_eq!(result, Err(RunError::OutOfMemory));
    }
}
