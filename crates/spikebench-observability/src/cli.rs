// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug flags
//!
//! Supports flags like `--debug-spikebench-npu-runtime` to raise one crate
//! to debug level while everything else stays at the base level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

pub const DEBUG_ENV: &str = "SPIKEBENCH_DEBUG";

/// Crates with debug logging enabled
///
/// # Example
/// ```rust
/// use spikebench_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-spikebench-model".to_string()]);
/// assert!(flags.is_enabled("spikebench-model"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for `--debug-{crate-name}` and `--debug-all`
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Comma separated crate names, or `all`
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enable(crate_name);
            }
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `EnvFilter` directives, e.g. `spikebench-model=debug,info`
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(base_level.to_lowercase());
        filters.join(",")
    }
}

/// Debug flags from the process arguments plus `SPIKEBENCH_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]
  {env}=all
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "va_benchmark".to_string(),
            "--debug-spikebench-npu-runtime".to_string(),
        ]);
        assert!(flags.is_enabled("spikebench-npu-runtime"));
        assert!(!flags.is_enabled("spikebench-model"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value("spikebench-model, spikebench-npu-driver,");
        assert_eq!(flags.enabled_crates.len(), 2);
        assert!(flags.is_enabled("spikebench-npu-driver"));
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-spikebench-model".to_string()]);
        assert_eq!(flags.to_filter_string("WARN"), "spikebench-model=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
        assert!(debug_flags_help().contains(DEBUG_ENV));
    }
}
