// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikebench Configuration System
//!
//! Type-safe configuration loader for the benchmark binaries with support for:
//! - TOML file parsing (`spikebench.toml`)
//! - Environment variable overrides (`SPIKEBENCH_<KEY>`)
//! - CLI argument overrides (`section.key=value`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spikebench_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Excitatory: {}", config.network.num_excitatory());
//! println!("Timestep: {} ms", config.simulation.timestep);
//! ```
//!
//! This crate knows nothing about network or engine types; turning the flags
//! into a connectivity representation happens in the umbrella crate.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    CONFIG_FILE_NAME, CONFIG_PATH_ENV, OVERRIDE_KEYS,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = SpikebenchConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: SpikebenchConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
