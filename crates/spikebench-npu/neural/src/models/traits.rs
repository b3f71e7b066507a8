// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron model trait

use crate::types::{Result, Scalar};

/// A neuron model, implemented by its parameter set.
///
/// `update` advances one neuron by one timestep and reports whether it
/// spiked. It must be a pure function of its arguments so that neurons can
/// be updated in any order and on any number of threads.
pub trait NeuronModel: Copy + Send + Sync {
    /// Constants that depend on parameters and the timestep only
    type Derived: Copy + Send + Sync;

    /// Model name for logging/debugging
    fn model_name(&self) -> &'static str;

    /// Check parameter ranges
    fn validate(&self) -> Result<()>;

    /// Precompute timestep-dependent constants
    fn derive(&self, dt: Scalar) -> Self::Derived;

    /// Advance one neuron by `dt`; returns `true` if it spiked
    fn update(
        &self,
        derived: &Self::Derived,
        v: &mut Scalar,
        refractory_time: &mut Scalar,
        input_current: Scalar,
        dt: Scalar,
    ) -> bool;
}
