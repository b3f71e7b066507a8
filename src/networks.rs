// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Benchmark network definitions
//!
//! Turns a validated [`SpikebenchConfig`] into a [`NetworkDefinition`]:
//!
//! | flags                                   | representation | span         |
//! |-----------------------------------------|----------------|--------------|
//! | (none)                                  | Sparse         | postsynaptic |
//! | `presynaptic_parallelism`               | Sparse         | presynaptic  |
//! | `bitmask_connectivity`                  | Bitmask        | postsynaptic |
//! | `procedural_connectivity` + presynaptic | Procedural     | presynaptic  |
//!
//! Any other combination is rejected by `validate_config` before a network
//! is built.

use spikebench_config::{
    validate_config, ConfigError, ConnectivityConfig, SimulationConfig, SpikebenchConfig,
};
use spikebench_model::{
    ModelBuilder, ModelError, NetworkDefinition, NeuronInit, PopulationHandle, ProjectionSpec,
};
use spikebench_npu_neural::{
    ConnectivityKind, FixedProbability, GaussianNoise, LifParameters, ParallelStrategy, Scalar,
};
use spikebench_npu_runtime::CpuEngineConfig;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// The va_benchmark E/I network
#[derive(Debug, Clone)]
pub struct VaBenchmark {
    pub network: NetworkDefinition,
    pub excitatory: PopulationHandle,
    pub inhibitory: PopulationHandle,
}

/// The neuron_merge set of disconnected, noise-driven populations
#[derive(Debug, Clone)]
pub struct NeuronMerge {
    pub network: NetworkDefinition,
    pub populations: Vec<PopulationHandle>,
}

/// Representation and work partitioning selected by the connectivity flags
pub fn connectivity_choice(config: &ConnectivityConfig) -> (ConnectivityKind, ParallelStrategy) {
    let kind = if config.procedural_connectivity {
        ConnectivityKind::Procedural
    } else if config.bitmask_connectivity {
        ConnectivityKind::Bitmask
    } else {
        ConnectivityKind::Sparse
    };
    let strategy = if config.presynaptic_parallelism {
        ParallelStrategy::presynaptic(config.num_threads_per_spike)
    } else {
        ParallelStrategy::postsynaptic()
    };
    (kind, strategy)
}

pub fn engine_config(config: &SimulationConfig) -> CpuEngineConfig {
    CpuEngineConfig {
        num_threads: config.num_threads,
        memory_limit: config.memory_limit_bytes(),
    }
}

/// Build the E/I network: four FixedProbability projections (EE and II
/// without autapses) with scaled static weights and ExpCurr synapses
pub fn build_va_benchmark(config: &SpikebenchConfig) -> Result<VaBenchmark, SetupError> {
    validate_config(config)?;
    let net = &config.network;
    let (kind, strategy) = connectivity_choice(&config.connectivity);

    let mut model = ModelBuilder::new(
        "va_benchmark",
        config.simulation.timestep as Scalar,
        net.seed,
    );
    let params = LifParameters {
        v_reset: net.reset_voltage as Scalar,
        v_thresh: net.threshold_voltage as Scalar,
        ..LifParameters::default()
    };
    let init = NeuronInit::uniform_v(params.v_reset, params.v_thresh);
    let excitatory = model.add_population("E", net.num_excitatory(), params, init)?;
    let inhibitory = model.add_population("I", net.num_inhibitory(), params, init)?;

    let p = net.probability_connection;
    let w_exc = net.excitatory_weight() as Scalar;
    let w_inh = net.inhibitory_weight() as Scalar;
    for (name, source, target, rule, weight, tau_syn) in [
        ("EE", excitatory, excitatory, FixedProbability::no_autapse(p), w_exc, 5.0),
        ("EI", excitatory, inhibitory, FixedProbability::new(p), w_exc, 5.0),
        ("II", inhibitory, inhibitory, FixedProbability::no_autapse(p), w_inh, 10.0),
        ("IE", inhibitory, excitatory, FixedProbability::new(p), w_inh, 10.0),
    ] {
        model.add_projection(
            ProjectionSpec::new(name, source, target, rule)
                .connectivity(kind)
                .strategy(strategy)
                .weight(weight)
                .tau_syn(tau_syn),
        )?;
    }

    info!(
        target: "spikebench",
        "[SETUP] va_benchmark: E={} I={} p={} wE={:.3e} wI={:.3e} ({} / {} x{})",
        net.num_excitatory(),
        net.num_inhibitory(),
        p,
        w_exc,
        w_inh,
        kind,
        strategy.span,
        strategy.threads_per_spike
    );

    Ok(VaBenchmark {
        network: model.build()?,
        excitatory,
        inhibitory,
    })
}

/// LIF parameters of the neuron_merge populations
pub fn neuron_merge_parameters() -> LifParameters {
    LifParameters {
        capacitance: 1.0,
        tau_m: 20.0,
        v_rest: -70.0,
        v_reset: -70.0,
        v_thresh: -51.0,
        i_offset: 0.0,
        tau_refrac: 2.0,
    }
}

/// Build `num_populations` equal populations, each driven by its own
/// Gaussian noise source and without projections
pub fn build_neuron_merge(config: &SpikebenchConfig) -> Result<NeuronMerge, SetupError> {
    validate_config(config)?;
    let merge = &config.neuron_merge;

    let mut model = ModelBuilder::new(
        "neuron_merge",
        config.simulation.timestep as Scalar,
        config.network.seed,
    );
    let params = neuron_merge_parameters();
    let noise = GaussianNoise::new(merge.noise_mean as Scalar, merge.noise_sd as Scalar);
    let size = merge.population_size();

    let mut populations = Vec::with_capacity(merge.num_populations as usize);
    for k in 0..merge.num_populations {
        let pop = model.add_population(
            &format!("Excitatory{}", k),
            size,
            params,
            NeuronInit::resting_at(params.v_reset),
        )?;
        model.add_current_source(&format!("ExcitatoryCS{}", k), pop, noise)?;
        populations.push(pop);
    }

    info!(
        target: "spikebench",
        "[SETUP] neuron_merge: {} populations x {} neurons, noise N({}, {})",
        merge.num_populations,
        size,
        merge.noise_mean,
        merge.noise_sd
    );

    Ok(NeuronMerge {
        network: model.build()?,
        populations,
    })
}
