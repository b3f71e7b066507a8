// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neural parameter and connectivity construction

/// Errors raised while validating model parameters or building connectivity.
///
/// All of these are configuration errors: they surface while a network is
/// being described, before any simulation resources exist.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("connection probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("autapse exclusion needs a square projection, got {pre_size}x{post_size}")]
    AutapseShapeMismatch { pre_size: u32, post_size: u32 },

    #[error("{model}: {reason}")]
    InvalidParameter {
        model: &'static str,
        reason: &'static str,
    },

    #[error("threads per spike must be >= 1")]
    InvalidThreadsPerSpike,
}

pub type Result<T> = core::result::Result<T, NeuralError>;
