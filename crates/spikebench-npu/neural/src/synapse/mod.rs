// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synaptic algorithms: weight update, postsynaptic kernel and work partitioning

pub mod exp_curr;
pub mod strategy;

use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result, Scalar};

pub use exp_curr::ExpCurr;
pub use strategy::{ParallelStrategy, SpanType};

/// Static pulse weight update: every spike adds the same weight to the
/// postsynaptic input of each connected target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticPulse {
    /// Weight added per presynaptic spike (nA); negative for inhibition
    pub weight: Scalar,
}

impl StaticPulse {
    pub fn new(weight: Scalar) -> Self {
        Self { weight }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() {
            return Err(NeuralError::InvalidParameter {
                model: "StaticPulse",
                reason: "weight must be finite",
            });
        }
        Ok(())
    }
}

/// Axonal delay of a projection. Only same-step delivery exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SynapticDelay {
    /// A spike is visible to its targets' input in the step it was emitted
    #[default]
    NoDelay,
}
