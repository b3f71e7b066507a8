// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Neuron populations and the current sources attached to them.

A population is a block of `size` LIF neurons sharing one parameter set.
Per-neuron state (`V`, `RefracTime`) is described here only by its initial
value rule; the engine owns the actual vectors.
*/

use serde::{Deserialize, Serialize};
use spikebench_npu_neural::{GaussianNoise, LifParameters, NeuronModel, VarInit};
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use crate::error::{ModelError, ModelResult};

/// Stable index of a population within its network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PopulationHandle(pub(crate) u32);

impl PopulationHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Stable index of a current source within its network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentSourceHandle(pub(crate) u32);

impl CurrentSourceHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Initial values of the per-neuron LIF state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronInit {
    pub v: VarInit,
    pub refrac_time: VarInit,
}

impl NeuronInit {
    /// Every neuron starts at `v`, outside the refractory window
    pub fn resting_at(v: f32) -> Self {
        Self {
            v: VarInit::constant(v),
            refrac_time: VarInit::constant(0.0),
        }
    }

    /// V drawn uniformly from `[min, max)`, outside the refractory window
    pub fn uniform_v(min: f32, max: f32) -> Self {
        Self {
            v: VarInit::uniform(min, max),
            refrac_time: VarInit::constant(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationDef {
    pub name: String,
    pub size: u32,
    pub params: LifParameters,
    pub init: NeuronInit,
    /// Seed for drawing initial state
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSourceDef {
    pub name: String,
    pub target: PopulationHandle,
    pub noise: GaussianNoise,
    /// Seed for the per-step noise streams
    pub seed: u64,
}

/// Creates populations and attaches current sources.
///
/// Name uniqueness across the whole model is enforced by
/// [`ModelBuilder`](crate::ModelBuilder); this builder validates sizes,
/// parameters and handles.
#[derive(Debug, Clone)]
pub struct PopulationBuilder {
    network_seed: u64,
    populations: Vec<PopulationDef>,
    current_sources: Vec<CurrentSourceDef>,
}

impl PopulationBuilder {
    pub fn new(network_seed: u64) -> Self {
        Self {
            network_seed,
            populations: Vec::new(),
            current_sources: Vec::new(),
        }
    }

    /// Add a population of `size` LIF neurons
    pub fn add_population(
        &mut self,
        name: &str,
        size: u32,
        params: LifParameters,
        init: NeuronInit,
    ) -> ModelResult<PopulationHandle> {
        if size == 0 {
            return Err(ModelError::EmptyPopulation(name.to_string()));
        }
        params.validate().map_err(ModelError::invalid(name))?;
        init.v.validate().map_err(ModelError::invalid(name))?;
        init.refrac_time.validate().map_err(ModelError::invalid(name))?;

        let handle = PopulationHandle(self.populations.len() as u32);
        debug!(
            target: "spikebench-model",
            "[POPULATION] '{}' (#{}) size={} model={}",
            name,
            handle.0,
            size,
            params.model_name()
        );
        self.populations.push(PopulationDef {
            name: name.to_string(),
            size,
            params,
            init,
            seed: xxh64(name.as_bytes(), self.network_seed),
        });
        Ok(handle)
    }

    /// Inject Gaussian noise current into every neuron of `target`
    pub fn add_current_source(
        &mut self,
        name: &str,
        target: PopulationHandle,
        noise: GaussianNoise,
    ) -> ModelResult<CurrentSourceHandle> {
        self.population(target)
            .ok_or_else(|| ModelError::UnknownPopulation {
                handle: target.0,
                referenced_by: name.to_string(),
            })?;
        noise.validate().map_err(ModelError::invalid(name))?;

        let handle = CurrentSourceHandle(self.current_sources.len() as u32);
        debug!(
            target: "spikebench-model",
            "[CURRENT-SOURCE] '{}' -> population #{} mean={} sd={}",
            name,
            target.0,
            noise.mean,
            noise.sd
        );
        self.current_sources.push(CurrentSourceDef {
            name: name.to_string(),
            target,
            noise,
            seed: xxh64(name.as_bytes(), self.network_seed),
        });
        Ok(handle)
    }

    pub fn population(&self, handle: PopulationHandle) -> Option<&PopulationDef> {
        self.populations.get(handle.index())
    }

    pub fn populations(&self) -> &[PopulationDef] {
        &self.populations
    }

    pub fn current_sources(&self) -> &[CurrentSourceDef] {
        &self.current_sources
    }

    pub(crate) fn into_parts(self) -> (Vec<PopulationDef>, Vec<CurrentSourceDef>) {
        (self.populations, self.current_sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        let mut builder = PopulationBuilder::new(1);
        let err = builder.add_population("E", 0, LifParameters::default(), NeuronInit::resting_at(-60.0));
        assert_eq!(err, Err(ModelError::EmptyPopulation("E".into())));
    }

    #[test]
    fn test_handles_are_sequential() {
        let mut builder = PopulationBuilder::new(1);
        let params = LifParameters::default();
        let a = builder.add_population("A", 10, params, NeuronInit::resting_at(-60.0)).unwrap();
        let b = builder.add_population("B", 20, params, NeuronInit::resting_at(-60.0)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(builder.population(b).unwrap().size, 20);
    }

    #[test]
    fn test_invalid_lif_parameters_rejected() {
        let mut builder = PopulationBuilder::new(1);
        let params = LifParameters {
            v_reset: -40.0,
            ..LifParameters::default()
        };
        let err = builder
            .add_population("bad", 10, params, NeuronInit::resting_at(-60.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameters { ref name, .. } if name == "bad"));
    }

    #[test]
    fn test_current_source_needs_existing_population() {
        let mut builder = PopulationBuilder::new(1);
        let err = builder
            .add_current_source("noise", PopulationHandle(3), GaussianNoise::new(1.0, 0.25))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownPopulation { handle: 3, .. }));
    }

    #[test]
    fn test_negative_noise_sd_rejected() {
        let mut builder = PopulationBuilder::new(1);
        let pop = builder
            .add_population("P", 5, LifParameters::default(), NeuronInit::resting_at(-60.0))
            .unwrap();
        assert!(builder
            .add_current_source("noise", pop, GaussianNoise::new(1.0, -1.0))
            .is_err());
    }

    #[test]
    fn test_seeds_depend_on_name_and_network_seed() {
        let params = LifParameters::default();
        let init = NeuronInit::resting_at(-60.0);
        let mut a = PopulationBuilder::new(1);
        let mut b = PopulationBuilder::new(2);
        let pa = a.add_population("E", 5, params, init).unwrap();
        let pa2 = a.add_population("I", 5, params, init).unwrap();
        let pb = b.add_population("E", 5, params, init).unwrap();
        assert_ne!(a.population(pa).unwrap().seed, a.population(pa2).unwrap().seed);
        assert_ne!(a.population(pa).unwrap().seed, b.population(pb).unwrap().seed);
    }
}
