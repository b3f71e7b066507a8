// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikebench
//!
//! LIF spiking network construction and fixed-timestep benchmark simulation.
//!
//! ## Crates
//!
//! - [`neural`]: LIF model, ExpCurr synapses, connectivity generation and
//!   the Sparse / Bitmask / Procedural representations
//! - [`model`]: population, projection and model builders
//! - [`runtime`]: engine boundary and the multi-threaded CPU engine
//! - [`driver`]: simulation driver, clock, recorders and run analysis
//! - [`config`]: `spikebench.toml` loading with env and CLI overrides
//! - [`observability`]: logging setup and per-crate debug flags
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spikebench::prelude::*;
//! use spikebench::networks::build_va_benchmark;
//!
//! let mut config = SpikebenchConfig::default();
//! config.network.num_neurons = 4000;
//!
//! let bench = build_va_benchmark(&config).expect("valid configuration");
//! let engine = CpuEngine::new(CpuEngineConfig::default()).expect("engine");
//! let mut driver = SimulationDriver::new(engine, bench.network);
//! driver.allocate().expect("allocate");
//! driver.initialize().expect("initialize");
//!
//! let mut spikes = SpikeRecorder::new(bench.excitatory).with_path("spikes.csv");
//! let report = driver.run(1000.0, &mut [&mut spikes]).expect("run");
//! spikes.write_cache().expect("write spikes");
//! report.log();
//! ```

pub use spikebench_config as config;
pub use spikebench_model as model;
pub use spikebench_npu_driver as driver;
pub use spikebench_npu_neural as neural;
pub use spikebench_npu_runtime as runtime;
pub use spikebench_observability as observability;

pub mod cli;
pub mod networks;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::SpikebenchConfig;
    pub use crate::driver::{
        AnalogueFormat, AnalogueRecorder, NeuronSelection, Recorder, RunReport, SimulationDriver,
        SpikeRecorder,
    };
    pub use crate::model::{
        ModelBuilder, NetworkDefinition, NeuronInit, PopulationHandle, ProjectionSpec,
    };
    pub use crate::neural::{
        ConnectivityKind, FixedProbability, GaussianNoise, LifParameters, ParallelStrategy,
        SpanType,
    };
    pub use crate::runtime::{CpuEngine, CpuEngineConfig, Engine, HostView, PullRequest, StateVariable};
}
