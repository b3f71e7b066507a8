// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # spikebench Neural Computation
//!
//! Everything a single neuron or a single synapse needs, independent of how
//! the network is executed:
//! - **Types**: scalar type and error type
//! - **Models**: the LIF neuron model and initial-value rules
//! - **Synapse**: static pulse weights, the exponential postsynaptic current
//!   kernel and the parallelization strategy of a projection
//! - **Current sources**: Gaussian noise injection
//! - **Connectivity**: fixed-probability connectivity in sparse, procedural
//!   and bitmask representations

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connectivity;
pub mod current_source;
pub mod models;
pub mod synapse;
pub mod types;

pub use connectivity::{
    BitmaskConnectivity, ConnectivityGenerator, ConnectivityKind, ConnectivityRepresentation,
    FixedProbability, ProceduralConnectivity, RowTargets, SparseConnectivity,
};
pub use current_source::GaussianNoise;
pub use models::{LifDerived, LifParameters, NeuronModel, VarInit};
pub use synapse::{ExpCurr, ParallelStrategy, SpanType, StaticPulse, SynapticDelay};
pub use types::{NeuralError, Result, Scalar};
