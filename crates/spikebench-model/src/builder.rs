// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Model Builder - composes populations, current sources and projections.

```text
ModelBuilder::new(name, dt, seed)
    ├── add_population      ─┐
    ├── add_current_source   ├── names unique across all three kinds
    ├── add_projection      ─┘
    └── build()  ──►  NetworkDefinition   (builder consumed)
```
*/

use ahash::AHashSet;
use spikebench_npu_neural::{GaussianNoise, LifParameters, Scalar};
use tracing::info;

use crate::error::{ModelError, ModelResult};
use crate::network::NetworkDefinition;
use crate::population::{CurrentSourceHandle, NeuronInit, PopulationBuilder, PopulationHandle};
use crate::projection::{ProjectionBuilder, ProjectionHandle, ProjectionSpec};

pub struct ModelBuilder {
    name: String,
    dt: Scalar,
    seed: u64,
    names: AHashSet<String>,
    populations: PopulationBuilder,
    projections: ProjectionBuilder,
}

impl ModelBuilder {
    /// `seed` drives initial state, noise and connectivity of the whole model
    pub fn new(name: impl Into<String>, dt: Scalar, seed: u64) -> Self {
        Self {
            name: name.into(),
            dt,
            seed,
            names: AHashSet::new(),
            populations: PopulationBuilder::new(seed),
            projections: ProjectionBuilder::new(seed),
        }
    }

    fn check_name(&self, name: &str) -> ModelResult<()> {
        if self.names.contains(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn add_population(
        &mut self,
        name: &str,
        size: u32,
        params: LifParameters,
        init: NeuronInit,
    ) -> ModelResult<PopulationHandle> {
        self.check_name(name)?;
        let handle = self.populations.add_population(name, size, params, init)?;
        self.names.insert(name.to_string());
        Ok(handle)
    }

    pub fn add_current_source(
        &mut self,
        name: &str,
        target: PopulationHandle,
        noise: GaussianNoise,
    ) -> ModelResult<CurrentSourceHandle> {
        self.check_name(name)?;
        let handle = self.populations.add_current_source(name, target, noise)?;
        self.names.insert(name.to_string());
        Ok(handle)
    }

    pub fn add_projection(&mut self, spec: ProjectionSpec) -> ModelResult<ProjectionHandle> {
        self.check_name(&spec.name)?;
        let name = spec.name.clone();
        let handle = self.projections.add_projection(&self.populations, spec)?;
        self.names.insert(name);
        Ok(handle)
    }

    pub fn populations(&self) -> &PopulationBuilder {
        &self.populations
    }

    pub fn projections(&self) -> &ProjectionBuilder {
        &self.projections
    }

    /// Freeze the topology
    pub fn build(self) -> ModelResult<NetworkDefinition> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ModelError::InvalidTimestep(self.dt));
        }
        let (populations, current_sources) = self.populations.into_parts();
        let network = NetworkDefinition {
            name: self.name,
            dt: self.dt,
            seed: self.seed,
            populations,
            current_sources,
            projections: self.projections.into_projections(),
        };
        info!(
            target: "spikebench-model",
            "[MODEL] Built '{}': {} populations, {} current sources, {} projections",
            network.name,
            network.populations.len(),
            network.current_sources.len(),
            network.projections.len()
        );
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikebench_npu_neural::FixedProbability;

    fn params() -> LifParameters {
        LifParameters::default()
    }

    #[test]
    fn test_names_unique_across_kinds() {
        let mut model = ModelBuilder::new("test", 1.0, 0);
        let e = model
            .add_population("E", 10, params(), NeuronInit::resting_at(-60.0))
            .unwrap();
        assert_eq!(
            model.add_population("E", 10, params(), NeuronInit::resting_at(-60.0)),
            Err(ModelError::DuplicateName("E".into()))
        );
        assert_eq!(
            model.add_current_source("E", e, GaussianNoise::new(1.0, 0.1)),
            Err(ModelError::DuplicateName("E".into()))
        );
        assert!(model
            .add_projection(ProjectionSpec::new("E", e, e, FixedProbability::new(0.1)))
            .is_err());
    }

    #[test]
    fn test_failed_add_does_not_reserve_name() {
        let mut model = ModelBuilder::new("test", 1.0, 0);
        assert!(model
            .add_population("E", 0, params(), NeuronInit::resting_at(-60.0))
            .is_err());
        assert!(model
            .add_population("E", 5, params(), NeuronInit::resting_at(-60.0))
            .is_ok());
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        for dt in [0.0, -1.0, f32::NAN] {
            let model = ModelBuilder::new("test", dt, 0);
            assert!(matches!(model.build(), Err(ModelError::InvalidTimestep(_))));
        }
    }

    #[test]
    fn test_build_preserves_order_and_lookup() {
        let mut model = ModelBuilder::new("net", 0.5, 3);
        let e = model
            .add_population("E", 8, params(), NeuronInit::resting_at(-60.0))
            .unwrap();
        let i = model
            .add_population("I", 2, params(), NeuronInit::resting_at(-60.0))
            .unwrap();
        model
            .add_projection(ProjectionSpec::new("EI", e, i, FixedProbability::new(0.5)))
            .unwrap();
        model
            .add_projection(ProjectionSpec::new("IE", i, e, FixedProbability::new(0.5)))
            .unwrap();
        model.add_current_source("noise", e, GaussianNoise::new(0.0, 1.0)).unwrap();

        let net = model.build().unwrap();
        assert_eq!(net.name(), "net");
        assert_eq!(net.dt(), 0.5);
        assert_eq!(net.total_neurons(), 10);
        assert_eq!(net.population_by_name("I"), Some(i));
        assert_eq!(net.incoming_projections(e).count(), 1);
        assert_eq!(net.incoming_projections(i).next().unwrap().1.name, "EI");
        assert_eq!(net.current_sources_for(e).count(), 1);
        assert_eq!(net.current_sources_for(i).count(), 0);
        assert!(net.projection_by_name("IE").is_some());
    }
}
