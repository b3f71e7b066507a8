// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural Types Module
//!
//! Core type definitions shared by every spikebench crate.

pub mod error;

pub use error::{NeuralError, Result};

/// Floating point type of all per-neuron and per-synapse state.
///
/// Voltage dumps are written as raw arrays of this type, so its size defines
/// the "bytes per scalar" of the analogue output format.
pub type Scalar = f32;
