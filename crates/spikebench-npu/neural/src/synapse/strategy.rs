// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Work partitioning of synaptic delivery
//!
//! A strategy says how the delivery work of one projection is split across
//! workers. It never changes which pairs receive current or the values they
//! receive.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{NeuralError, Result};

/// Which side of a projection delivery work is partitioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanType {
    /// One work item per presynaptic spike (row), optionally split further
    Presynaptic,

    /// One work item per postsynaptic neuron (column)
    #[default]
    Postsynaptic,
}

impl fmt::Display for SpanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanType::Presynaptic => write!(f, "presynaptic"),
            SpanType::Postsynaptic => write!(f, "postsynaptic"),
        }
    }
}

/// Span type plus the number of workers sharing one presynaptic row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParallelStrategy {
    pub span: SpanType,

    /// Workers per presynaptic spike; only meaningful for presynaptic span
    pub threads_per_spike: u32,
}

impl ParallelStrategy {
    pub fn presynaptic(threads_per_spike: u32) -> Self {
        Self {
            span: SpanType::Presynaptic,
            threads_per_spike,
        }
    }

    pub fn postsynaptic() -> Self {
        Self {
            span: SpanType::Postsynaptic,
            threads_per_spike: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads_per_spike == 0 {
            return Err(NeuralError::InvalidThreadsPerSpike);
        }
        Ok(())
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::postsynaptic()
    }
}
