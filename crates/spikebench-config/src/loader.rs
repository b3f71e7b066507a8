// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values, built-in defaults when no file exists)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SpikebenchConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "spikebench.toml";
pub const CONFIG_PATH_ENV: &str = "SPIKEBENCH_CONFIG_PATH";

/// Every overridable key: (section, key, environment variable)
pub const OVERRIDE_KEYS: &[(&str, &str, &str)] = &[
    ("network", "num_neurons", "SPIKEBENCH_NUM_NEURONS"),
    ("network", "excitatory_inhibitory_ratio", "SPIKEBENCH_EXCITATORY_INHIBITORY_RATIO"),
    ("network", "probability_connection", "SPIKEBENCH_PROBABILITY_CONNECTION"),
    ("network", "reset_voltage", "SPIKEBENCH_RESET_VOLTAGE"),
    ("network", "threshold_voltage", "SPIKEBENCH_THRESHOLD_VOLTAGE"),
    ("network", "seed", "SPIKEBENCH_SEED"),
    ("connectivity", "presynaptic_parallelism", "SPIKEBENCH_PRESYNAPTIC_PARALLELISM"),
    ("connectivity", "procedural_connectivity", "SPIKEBENCH_PROCEDURAL_CONNECTIVITY"),
    ("connectivity", "bitmask_connectivity", "SPIKEBENCH_BITMASK_CONNECTIVITY"),
    ("connectivity", "num_threads_per_spike", "SPIKEBENCH_NUM_THREADS_PER_SPIKE"),
    ("simulation", "timestep", "SPIKEBENCH_TIMESTEP"),
    ("simulation", "duration", "SPIKEBENCH_DURATION"),
    ("simulation", "num_threads", "SPIKEBENCH_NUM_THREADS"),
    ("simulation", "memory_limit_mb", "SPIKEBENCH_MEMORY_LIMIT_MB"),
    ("recording", "record_spikes", "SPIKEBENCH_RECORD_SPIKES"),
    ("recording", "record_voltages", "SPIKEBENCH_RECORD_VOLTAGES"),
    ("recording", "output_dir", "SPIKEBENCH_OUTPUT_DIR"),
    ("recording", "spike_file", "SPIKEBENCH_SPIKE_FILE"),
    ("recording", "voltage_file", "SPIKEBENCH_VOLTAGE_FILE"),
    ("recording", "delimiter", "SPIKEBENCH_DELIMITER"),
    ("recording", "header", "SPIKEBENCH_HEADER"),
    ("recording", "voltage_sample_interval", "SPIKEBENCH_VOLTAGE_SAMPLE_INTERVAL"),
    ("logging", "level", "SPIKEBENCH_LOG_LEVEL"),
    ("logging", "file_logging", "SPIKEBENCH_FILE_LOGGING"),
    ("logging", "log_dir", "SPIKEBENCH_LOG_DIR"),
    ("neuron_merge", "total_neurons", "SPIKEBENCH_TOTAL_NEURONS"),
    ("neuron_merge", "num_populations", "SPIKEBENCH_NUM_POPULATIONS"),
    ("neuron_merge", "noise_mean", "SPIKEBENCH_NOISE_MEAN"),
    ("neuron_merge", "noise_sd", "SPIKEBENCH_NOISE_SD"),
];

/// Find the spikebench configuration file
///
/// Search order:
/// 1. `SPIKEBENCH_CONFIG_PATH` environment variable (must exist)
/// 2. Current working directory: `./spikebench.toml`
/// 3. Up to 5 parent directories
///
/// Returns `Ok(None)` when nothing was found in the search locations.
pub fn find_config_file() -> ConfigResult<Option<PathBuf>> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    if let Ok(cwd) = env::current_dir() {
        let mut current = Some(cwd.as_path());
        for _ in 0..=5 {
            let Some(dir) = current else { break };
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(candidate));
            }
            current = dir.parent();
        }
    }
    Ok(None)
}

/// Load configuration
///
/// * `config_path` - explicit file; it must exist. If `None`, the file is
///   searched for and defaults are used when none is found.
/// * `cli_args` - `section.key` (or bare `key`) to value overrides
///
/// Validation is left to [`validate_config`](crate::validate_config) so the
/// caller decides when to fail.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SpikebenchConfig> {
    let config_file = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            Some(path.to_path_buf())
        }
        None => find_config_file()?,
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => SpikebenchConfig::default(),
    };

    apply_environment_overrides(&mut config)?;

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply `SPIKEBENCH_<KEY>` environment variables (see [`OVERRIDE_KEYS`])
pub fn apply_environment_overrides(config: &mut SpikebenchConfig) -> ConfigResult<()> {
    for &(section, key, var) in OVERRIDE_KEYS {
        if let Ok(value) = env::var(var) {
            set_value(config, section, key, &value)?;
        }
    }
    Ok(())
}

/// Apply CLI overrides, e.g. `{"network.num_neurons": "4000", "timestep": "0.1"}`
pub fn apply_cli_overrides(
    config: &mut SpikebenchConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    // Sorted so that conflicting keys always resolve the same way
    let mut entries: Vec<_> = cli_args.iter().collect();
    entries.sort();
    for (name, value) in entries {
        let (section, key) = resolve_key(name)?;
        set_value(config, section, key, value)?;
    }
    Ok(())
}

/// Map `section.key` or a bare `key` to its canonical pair
fn resolve_key(name: &str) -> ConfigResult<(&'static str, &'static str)> {
    let found = match name.split_once('.') {
        Some((section, key)) => OVERRIDE_KEYS
            .iter()
            .find(|(s, k, _)| *s == section && *k == key),
        None => OVERRIDE_KEYS.iter().find(|(_, k, _)| *k == name),
    };
    found
        .map(|&(s, k, _)| (s, k))
        .ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
}

fn parse<T: FromStr>(section: &str, key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        ConfigError::InvalidValue(format!("{}.{} = '{}'", section, key, value))
    })
}

fn parse_bool(section: &str, key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{}.{} = '{}' (expected true/false)",
            section, key, value
        ))),
    }
}

fn set_value(config: &mut SpikebenchConfig, section: &str, key: &str, value: &str) -> ConfigResult<()> {
    let (s, k) = (section, key);
    match (section, key) {
        ("network", "num_neurons") => config.network.num_neurons = parse(s, k, value)?,
        ("network", "excitatory_inhibitory_ratio") => {
            config.network.excitatory_inhibitory_ratio = parse(s, k, value)?
        }
        ("network", "probability_connection") => {
            config.network.probability_connection = parse(s, k, value)?
        }
        ("network", "reset_voltage") => config.network.reset_voltage = parse(s, k, value)?,
        ("network", "threshold_voltage") => config.network.threshold_voltage = parse(s, k, value)?,
        ("network", "seed") => config.network.seed = parse(s, k, value)?,

        ("connectivity", "presynaptic_parallelism") => {
            config.connectivity.presynaptic_parallelism = parse_bool(s, k, value)?
        }
        ("connectivity", "procedural_connectivity") => {
            config.connectivity.procedural_connectivity = parse_bool(s, k, value)?
        }
        ("connectivity", "bitmask_connectivity") => {
            config.connectivity.bitmask_connectivity = parse_bool(s, k, value)?
        }
        ("connectivity", "num_threads_per_spike") => {
            config.connectivity.num_threads_per_spike = parse(s, k, value)?
        }

        ("simulation", "timestep") => config.simulation.timestep = parse(s, k, value)?,
        ("simulation", "duration") => config.simulation.duration = parse(s, k, value)?,
        ("simulation", "num_threads") => config.simulation.num_threads = parse(s, k, value)?,
        ("simulation", "memory_limit_mb") => config.simulation.memory_limit_mb = parse(s, k, value)?,

        ("recording", "record_spikes") => config.recording.record_spikes = parse_bool(s, k, value)?,
        ("recording", "record_voltages") => {
            config.recording.record_voltages = parse_bool(s, k, value)?
        }
        ("recording", "output_dir") => config.recording.output_dir = PathBuf::from(value),
        ("recording", "spike_file") => config.recording.spike_file = value.to_string(),
        ("recording", "voltage_file") => config.recording.voltage_file = value.to_string(),
        ("recording", "delimiter") => config.recording.delimiter = value.to_string(),
        ("recording", "header") => config.recording.header = parse_bool(s, k, value)?,
        ("recording", "voltage_sample_interval") => {
            config.recording.voltage_sample_interval = parse(s, k, value)?
        }

        ("logging", "level") => config.logging.level = value.to_string(),
        ("logging", "file_logging") => config.logging.file_logging = parse_bool(s, k, value)?,
        ("logging", "log_dir") => config.logging.log_dir = PathBuf::from(value),

        ("neuron_merge", "total_neurons") => config.neuron_merge.total_neurons = parse(s, k, value)?,
        ("neuron_merge", "num_populations") => {
            config.neuron_merge.num_populations = parse(s, k, value)?
        }
        ("neuron_merge", "noise_mean") => config.neuron_merge.noise_mean = parse(s, k, value)?,
        ("neuron_merge", "noise_sd") => config.neuron_merge.noise_sd = parse(s, k, value)?,

        _ => return Err(ConfigError::UnknownKey(format!("{}.{}", section, key))),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let found = find_config_file();
        env::set_var(CONFIG_PATH_ENV, dir.path().join("missing.toml"));
        let missing = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(found.unwrap(), Some(config_path));
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_partial_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("SPIKEBENCH_NUM_NEURONS");
        env::remove_var("SPIKEBENCH_TIMESTEP");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[network]").unwrap();
        writeln!(file, "num_neurons = 4000").unwrap();
        writeln!(file, "[connectivity]").unwrap();
        writeln!(file, "presynaptic_parallelism = true").unwrap();
        writeln!(file, "procedural_connectivity = true").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.network.num_neurons, 4000);
        assert!(config.connectivity.procedural_connectivity);
        // Untouched keys keep their defaults
        assert_eq!(config.network.excitatory_inhibitory_ratio, 4.0);
        assert_eq!(config.simulation.timestep, 1.0);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")), None);
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[network\nnum_neurons = ").unwrap();
        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SpikebenchConfig::default();

        env::set_var("SPIKEBENCH_NUM_NEURONS", "8000");
        env::set_var("SPIKEBENCH_BITMASK_CONNECTIVITY", "yes");
        let applied = apply_environment_overrides(&mut config);
        env::remove_var("SPIKEBENCH_NUM_NEURONS");
        env::remove_var("SPIKEBENCH_BITMASK_CONNECTIVITY");

        applied.unwrap();
        assert_eq!(config.network.num_neurons, 8000);
        assert!(config.connectivity.bitmask_connectivity);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SpikebenchConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("network.num_neurons".to_string(), "2000".to_string());
        cli_args.insert("timestep".to_string(), "0.1".to_string());
        cli_args.insert("recording.output_dir".to_string(), "/tmp/out".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.network.num_neurons, 2000);
        assert_eq!(config.simulation.timestep, 0.1);
        assert_eq!(config.recording.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_cli_rejects_bad_keys_and_values() {
        let mut config = SpikebenchConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("network.num_synapses".to_string(), "1".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::UnknownKey(_))
        ));

        let mut cli_args = HashMap::new();
        cli_args.insert("num_neurons".to_string(), "many".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "timestep = 0.5").unwrap();
        writeln!(file, "duration = 200.0").unwrap();

        env::set_var("SPIKEBENCH_TIMESTEP", "0.25");
        env::set_var("SPIKEBENCH_DURATION", "300.0");

        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.timestep".to_string(), "0.1".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));

        env::remove_var("SPIKEBENCH_TIMESTEP");
        env::remove_var("SPIKEBENCH_DURATION");

        // CLI wins for timestep, env wins for duration (no CLI override)
        let config = config.unwrap();
        assert_eq!(config.simulation.timestep, 0.1);
        assert_eq!(config.simulation.duration, 300.0);
    }

    #[test]
    fn test_every_key_is_settable() {
        let mut config = SpikebenchConfig::default();
        for &(section, key, var) in OVERRIDE_KEYS {
            assert!(var.starts_with("SPIKEBENCH_"));
            let value = match key {
                k if k.ends_with("parallelism")
                    || k.ends_with("connectivity")
                    || k.starts_with("record_")
                    || k == "header"
                    || k == "file_logging" =>
                {
                    "true"
                }
                _ => "3",
            };
            set_value(&mut config, section, key, value).unwrap();
        }
    }
}
