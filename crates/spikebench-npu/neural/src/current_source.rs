// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Current sources injected directly into a population's input

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result, Scalar};

/// Gaussian white-noise current: every neuron receives an independent draw
/// of `mean + sd × N(0, 1)` on every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianNoise {
    /// Mean current (nA)
    pub mean: Scalar,

    /// Standard deviation (nA)
    pub sd: Scalar,
}

impl GaussianNoise {
    pub fn new(mean: Scalar, sd: Scalar) -> Self {
        Self { mean, sd }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() {
            return Err(NeuralError::InvalidParameter {
                model: "GaussianNoise",
                reason: "mean must be finite",
            });
        }
        if !(self.sd >= 0.0) || !self.sd.is_finite() {
            return Err(NeuralError::InvalidParameter {
                model: "GaussianNoise",
                reason: "standard deviation must be finite and >= 0",
            });
        }
        Ok(())
    }

    /// Draw this step's injected current for one neuron
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Scalar {
        if self.sd == 0.0 {
            return self.mean;
        }
        let z: Scalar = rng.sample(StandardNormal);
        self.mean + self.sd * z
    }
}
