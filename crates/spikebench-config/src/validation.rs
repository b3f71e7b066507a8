// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected and reported together, before any network
//! is built or any engine memory is reserved.

use crate::{ConfigError, ConfigResult, SpikebenchConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    IncompatibleFlags { flags: String, reason: String },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompatibleFlags { flags, reason } => {
                write!(f, "Incompatible connectivity flags {}: {}", flags, reason)
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &SpikebenchConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }
    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All violations, in section order
pub fn collect_errors(config: &SpikebenchConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_connectivity_flags(config, &mut errors);
    validate_network(config, &mut errors);
    validate_simulation(config, &mut errors);
    validate_recording(config, &mut errors);
    validate_logging(config, &mut errors);
    validate_neuron_merge(config, &mut errors);
    errors
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: &str, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    });
}

/// Procedural rows need presynaptic work items; bitmask rows need
/// postsynaptic ones; procedural and bitmask are mutually exclusive.
fn validate_connectivity_flags(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    let c = &config.connectivity;
    if c.procedural_connectivity && c.bitmask_connectivity {
        errors.push(ConfigValidationError::IncompatibleFlags {
            flags: "procedural_connectivity + bitmask_connectivity".to_string(),
            reason: "a projection has exactly one representation".to_string(),
        });
    }
    if c.procedural_connectivity && !c.presynaptic_parallelism {
        errors.push(ConfigValidationError::IncompatibleFlags {
            flags: "procedural_connectivity + postsynaptic parallelism".to_string(),
            reason: "procedural connectivity requires presynaptic_parallelism = true".to_string(),
        });
    }
    if c.bitmask_connectivity && c.presynaptic_parallelism {
        errors.push(ConfigValidationError::IncompatibleFlags {
            flags: "bitmask_connectivity + presynaptic parallelism".to_string(),
            reason: "bitmask connectivity requires presynaptic_parallelism = false".to_string(),
        });
    }
    if c.num_threads_per_spike == 0 {
        invalid(errors, "connectivity.num_threads_per_spike", "must be >= 1");
    }
}

fn validate_network(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    let n = &config.network;
    if n.num_neurons == 0 {
        invalid(errors, "network.num_neurons", "must be positive");
    }
    if !(n.excitatory_inhibitory_ratio.is_finite() && n.excitatory_inhibitory_ratio > 0.0) {
        invalid(errors, "network.excitatory_inhibitory_ratio", "must be positive");
    } else if n.num_neurons > 0 && (n.num_excitatory() == 0 || n.num_inhibitory() == 0) {
        invalid(
            errors,
            "network.num_neurons",
            "too small to hold both an excitatory and an inhibitory population",
        );
    }
    if !(0.0..=1.0).contains(&n.probability_connection) {
        invalid(errors, "network.probability_connection", "must be in [0, 1]");
    }
    if !(n.reset_voltage.is_finite() && n.threshold_voltage.is_finite()) {
        invalid(errors, "network.reset_voltage", "voltages must be finite");
    } else if n.threshold_voltage <= n.reset_voltage {
        invalid(errors, "network.threshold_voltage", "must be above reset_voltage");
    }
}

fn validate_simulation(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    let s = &config.simulation;
    if !(s.timestep.is_finite() && s.timestep > 0.0) {
        invalid(errors, "simulation.timestep", "must be positive");
    }
    if !(s.duration.is_finite() && s.duration >= 0.0) {
        invalid(errors, "simulation.duration", "must be non-negative");
    }
}

fn validate_recording(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    let r = &config.recording;
    if r.record_spikes && r.spike_file.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "recording.spike_file".to_string(),
        });
    }
    if r.record_voltages && r.voltage_file.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "recording.voltage_file".to_string(),
        });
    }
    if r.delimiter.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "recording.delimiter".to_string(),
        });
    }
    if r.voltage_sample_interval == 0 {
        invalid(errors, "recording.voltage_sample_interval", "must be >= 1");
    }
}

fn validate_logging(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        invalid(
            errors,
            "logging.level",
            "must be one of trace, debug, info, warn, error",
        );
    }
}

fn validate_neuron_merge(config: &SpikebenchConfig, errors: &mut Vec<ConfigValidationError>) {
    let m = &config.neuron_merge;
    if m.num_populations == 0 {
        invalid(errors, "neuron_merge.num_populations", "must be positive");
    } else if m.total_neurons < m.num_populations {
        invalid(
            errors,
            "neuron_merge.total_neurons",
            "must be at least num_populations",
        );
    }
    if !(m.noise_sd.is_finite() && m.noise_sd >= 0.0) || !m.noise_mean.is_finite() {
        invalid(errors, "neuron_merge.noise_sd", "noise must be finite with sd >= 0");
    }
}
