// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exponentially decaying postsynaptic current
//!
//! Each projection keeps one accumulator `in_syn` per target neuron. Spikes
//! add their weight to it; every neuron update reads it as current and then
//! lets it decay:
//!
//! ```text
//! I_syn   += init × in_syn         init  = (TauSyn / dt) × (1 − exp(−dt / TauSyn))
//! in_syn  ×= decay                 decay = exp(−dt / TauSyn)
//! ```
//!
//! `init` normalises the kernel so that the charge delivered by one unit of
//! weight is independent of `dt`.

use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result, Scalar};

/// Exponential current kernel parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpCurr {
    /// Synaptic time constant (ms)
    pub tau_syn: Scalar,
}

impl ExpCurr {
    pub fn new(tau_syn: Scalar) -> Self {
        Self { tau_syn }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tau_syn > 0.0) {
            return Err(NeuralError::InvalidParameter {
                model: "ExpCurr",
                reason: "synaptic time constant must be > 0",
            });
        }
        Ok(())
    }

    /// Per-step decay factor of the accumulator
    #[inline]
    pub fn decay(&self, dt: Scalar) -> Scalar {
        (-dt / self.tau_syn).exp()
    }

    /// Scale applied when the accumulator is read as current
    #[inline]
    pub fn init(&self, dt: Scalar) -> Scalar {
        (self.tau_syn / dt) * (1.0 - (-dt / self.tau_syn).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_and_init_factors() {
        let k = ExpCurr::new(5.0);
        let decay = k.decay(1.0);
        assert!((decay - (-0.2f32).exp()).abs() < 1e-7);
        // init × dt approximates TauSyn × (1 - decay)
        assert!((k.init(1.0) - 5.0 * (1.0 - decay)).abs() < 1e-6);
        // small dt: init -> 1
        assert!((k.init(1e-2) - 1.0).abs() < 2e-3);
    }

    #[test]
    fn test_validation() {
        assert!(ExpCurr::new(10.0).validate().is_ok());
        assert!(ExpCurr::new(0.0).validate().is_err());
        assert!(ExpCurr::new(-1.0).validate().is_err());
    }
}
