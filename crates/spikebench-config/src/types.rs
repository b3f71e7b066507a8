// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `spikebench.toml`. Every field has a
//! default, so a partial file (or no file at all) yields the 150 000 neuron
//! `va_benchmark` parameter set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikebenchConfig {
    pub network: NetworkConfig,
    pub connectivity: ConnectivityConfig,
    pub simulation: SimulationConfig,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
    pub neuron_merge: NeuronMergeConfig,
}

/// E/I network shape and LIF voltages
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub num_neurons: u32,
    /// Excitatory : inhibitory cell ratio
    pub excitatory_inhibitory_ratio: f64,
    pub probability_connection: f64,
    pub reset_voltage: f64,
    pub threshold_voltage: f64,
    /// Network seed; population and projection seeds derive from it
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_neurons: 150_000,
            excitatory_inhibitory_ratio: 4.0,
            probability_connection: 0.1,
            reset_voltage: -60.0,
            threshold_voltage: -50.0,
            seed: 1234,
        }
    }
}

impl NetworkConfig {
    /// `round(N·r / (1 + r))`
    pub fn num_excitatory(&self) -> u32 {
        let n = self.num_neurons as f64;
        let r = self.excitatory_inhibitory_ratio;
        ((n * r) / (1.0 + r)).round() as u32
    }

    pub fn num_inhibitory(&self) -> u32 {
        self.num_neurons.saturating_sub(self.num_excitatory())
    }

    /// Keeps total input per neuron constant relative to the 4000 neuron,
    /// p = 0.02 reference network. Zero when p = 0, as there are no synapses.
    pub fn weight_scale(&self) -> f64 {
        if self.probability_connection <= 0.0 {
            return 0.0;
        }
        (4000.0 / self.num_neurons as f64) * (0.02 / self.probability_connection)
    }

    pub fn excitatory_weight(&self) -> f64 {
        4.0e-3 * self.weight_scale()
    }

    pub fn inhibitory_weight(&self) -> f64 {
        -51.0e-3 * self.weight_scale()
    }
}

/// Connectivity representation and work partitioning flags
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// One work item per spike instead of per target neuron
    pub presynaptic_parallelism: bool,
    /// Regenerate rows on the fly (requires presynaptic parallelism)
    pub procedural_connectivity: bool,
    /// Dense bit matrix (requires postsynaptic parallelism)
    pub bitmask_connectivity: bool,
    pub num_threads_per_spike: u32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            presynaptic_parallelism: false,
            procedural_connectivity: false,
            bitmask_connectivity: false,
            num_threads_per_spike: 8,
        }
    }
}

/// Clock and engine settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// ms
    pub timestep: f64,
    /// ms
    pub duration: f64,
    /// Worker threads (0 = all cores)
    pub num_threads: usize,
    /// Allocation cap in MiB (0 = unlimited)
    pub memory_limit_mb: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0,
            duration: 1000.0,
            num_threads: 0,
            memory_limit_mb: 0,
        }
    }
}

impl SimulationConfig {
    pub fn memory_limit_bytes(&self) -> Option<usize> {
        (self.memory_limit_mb > 0).then(|| (self.memory_limit_mb as usize).saturating_mul(1024 * 1024))
    }
}

/// Output files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub record_spikes: bool,
    pub record_voltages: bool,
    pub output_dir: PathBuf,
    pub spike_file: String,
    pub voltage_file: String,
    pub delimiter: String,
    pub header: bool,
    /// Sample voltages every N steps
    pub voltage_sample_interval: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            record_spikes: true,
            record_voltages: false,
            output_dir: PathBuf::from("."),
            spike_file: "spikes.csv".to_string(),
            voltage_file: "voltages.bin".to_string(),
            delimiter: ",".to_string(),
            header: true,
            voltage_sample_interval: 1,
        }
    }
}

impl RecordingConfig {
    pub fn spike_path(&self) -> PathBuf {
        self.output_dir.join(&self.spike_file)
    }

    pub fn voltage_path(&self) -> PathBuf {
        self.output_dir.join(&self.voltage_file)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Also write JSON logs under `log_dir/run_<timestamp>/`
    pub file_logging: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Disconnected-population neuron update benchmark
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuronMergeConfig {
    pub total_neurons: u32,
    pub num_populations: u32,
    pub noise_mean: f64,
    pub noise_sd: f64,
}

impl Default for NeuronMergeConfig {
    fn default() -> Self {
        Self {
            total_neurons: 1_000_000,
            num_populations: 10,
            noise_mean: 1.0,
            noise_sd: 0.25,
        }
    }
}

impl NeuronMergeConfig {
    pub fn population_size(&self) -> u32 {
        self.total_neurons / self.num_populations.max(1)
    }
}
