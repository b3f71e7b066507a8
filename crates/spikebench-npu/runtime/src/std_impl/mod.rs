// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # CPU Engine - Standard (Desktop/Server)
//!
//! ## Features
//! - ✅ Dynamic allocation (`Vec`) with fallible reservation
//! - ✅ Parallel neuron update and spike delivery (Rayon)
//! - ✅ Optional dedicated worker pool and memory limit
//!
//! ## Determinism
//! Results do not depend on the number of worker threads or on the
//! projection's span type:
//! - neurons are updated in fixed chunks of [`NEURON_CHUNK`], and each
//!   chunk draws noise from its own stream keyed by (step, chunk)
//! - delivery counts incoming spikes per target as integers and then adds
//!   `weight × count`, so summation order never varies

pub mod cpu_engine;
pub mod population_state;
pub mod projection_state;

pub use cpu_engine::{CpuEngine, CpuEngineConfig};

use crate::error::{Result, RuntimeError};

/// Neurons per update chunk (also the noise stream granularity)
pub const NEURON_CHUNK: usize = 4096;

/// Targets per postsynaptic-span delivery block
pub const TARGET_BLOCK: usize = 4096;

/// `vec![value; len]` that reports allocation failure instead of aborting
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RuntimeError::OutOfMemory {
            requested_bytes: len.saturating_mul(core::mem::size_of::<T>()),
            limit_bytes: None,
        })?;
    v.resize(len, value);
    Ok(v)
}

/// Empty vector with room for `len` elements
pub(crate) fn try_with_capacity<T>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RuntimeError::OutOfMemory {
            requested_bytes: len.saturating_mul(core::mem::size_of::<T>()),
            limit_bytes: None,
        })?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_filled() {
        let v = try_filled(10, 1.5f32).unwrap();
        assert_eq!(v.len(), 10);
        assert!(v.iter().all(|&x| x == 1.5));
    }

    #[test]
    fn test_impossible_reservation_fails() {
        let err = try_with_capacity::<u64>(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, RuntimeError::OutOfMemory { .. }));
    }
}
