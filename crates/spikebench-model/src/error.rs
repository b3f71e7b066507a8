// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Errors raised while describing a network.

Every variant is a configuration error: it is returned by a builder call
before any engine resources have been requested.
*/

use spikebench_npu_neural::{ConnectivityKind, NeuralError, SpanType};

/// Result type for model construction
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Duplicate name: '{0}' is already used by another population, current source or projection")]
    DuplicateName(String),

    #[error("Population '{0}' must contain at least one neuron")]
    EmptyPopulation(String),

    #[error("Unknown population handle {handle} referenced by '{referenced_by}'")]
    UnknownPopulation { handle: u32, referenced_by: String },

    #[error("Projection '{projection}': {kind} connectivity is incompatible with {span} span")]
    IncompatibleStrategy {
        projection: String,
        kind: ConnectivityKind,
        span: SpanType,
    },

    #[error("Projection '{0}': autapse exclusion is only allowed when source and target are the same population")]
    AutapseAcrossPopulations(String),

    #[error("Timestep must be finite and > 0, got {0}")]
    InvalidTimestep(f32),

    #[error("'{name}': {source}")]
    InvalidParameters {
        name: String,
        #[source]
        source: NeuralError,
    },
}

impl ModelError {
    pub(crate) fn invalid(name: &str) -> impl FnOnce(NeuralError) -> ModelError + '_ {
        move |source| ModelError::InvalidParameters {
            name: name.to_string(),
            source,
        }
    }
}
