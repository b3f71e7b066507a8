// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Initial-value rules for per-neuron state variables

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result, Scalar};

/// How a state variable is seeded at initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VarInit {
    /// Every neuron starts at the same value
    Constant { value: Scalar },

    /// Each neuron draws independently from U[min, max)
    Uniform { min: Scalar, max: Scalar },
}

impl VarInit {
    pub fn constant(value: Scalar) -> Self {
        VarInit::Constant { value }
    }

    pub fn uniform(min: Scalar, max: Scalar) -> Self {
        VarInit::Uniform { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            VarInit::Constant { value } if !value.is_finite() => Err(NeuralError::InvalidParameter {
                model: "VarInit",
                reason: "constant must be finite",
            }),
            VarInit::Uniform { min, max } if !(min <= max) => Err(NeuralError::InvalidParameter {
                model: "VarInit",
                reason: "uniform range needs min <= max",
            }),
            _ => Ok(()),
        }
    }

    /// Draw the initial value for one neuron
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Scalar {
        match *self {
            VarInit::Constant { value } => value,
            VarInit::Uniform { min, max } => min + (max - min) * rng.gen::<Scalar>(),
        }
    }
}
