// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# spikebench Model Construction

Turns population sizes, connection probabilities and parallelism hints into
a concrete, validated network topology:

- [`PopulationBuilder`] creates LIF populations and attaches noise sources
- [`ProjectionBuilder`] binds projections to a connectivity representation
  and a parallelization strategy
- [`ModelBuilder`] composes both and hands out an immutable
  [`NetworkDefinition`]

Every rule violation is reported as a [`ModelError`] while the model is
described; nothing here touches an engine.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builder;
pub mod error;
pub mod network;
pub mod population;
pub mod projection;

pub use builder::ModelBuilder;
pub use error::{ModelError, ModelResult};
pub use network::{NetworkDefinition, NetworkSummary, ProjectionSummary};
pub use population::{
    CurrentSourceDef, CurrentSourceHandle, NeuronInit, PopulationBuilder, PopulationDef,
    PopulationHandle,
};
pub use projection::{
    span_supports, ProjectionBuilder, ProjectionDef, ProjectionHandle, ProjectionSpec,
};
