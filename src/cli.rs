// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command line front end shared by the benchmark binaries
//!
//! `--debug-<crate>` / `--debug-all` are dynamic flags, so they are split
//! off before clap sees the arguments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use spikebench_config::{load_config, validate_config, SpikebenchConfig};
use spikebench_npu_driver::RunReport;
use spikebench_observability::{
    init_logging, CrateDebugFlags, LogFormat, LoggingConfig as LoggingSettings, LoggingGuard,
    DEBUG_ENV,
};

/// Options every benchmark binary accepts
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Path to spikebench.toml (default: search ./ and parents, then built-in defaults)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override a configuration value, e.g. --set network.num_neurons=4000 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub overrides: Vec<(String, String)>,

    /// Directory for output files (overrides recording.output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Print console logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

/// Separate `--debug-*` flags from the arguments meant for clap
pub fn split_debug_flags<I>(args: I) -> (Vec<String>, CrateDebugFlags)
where
    I: IntoIterator<Item = String>,
{
    let (debug, rest): (Vec<String>, Vec<String>) =
        args.into_iter().partition(|a| a.starts_with("--debug-"));
    let mut flags = CrateDebugFlags::from_args(debug);
    if let Ok(value) = std::env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    (rest, flags)
}

impl CommonArgs {
    /// CLI overrides in the loader's `section.key -> value` form
    pub fn override_map(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = self.overrides.iter().cloned().collect();
        if let Some(dir) = &self.output_dir {
            map.insert("recording.output_dir".to_string(), dir.display().to_string());
        }
        map
    }

    /// Load, override and validate the configuration
    pub fn load_config(&self) -> Result<SpikebenchConfig> {
        let overrides = self.override_map();
        let config = load_config(self.config.as_deref(), Some(&overrides))
            .context("Failed to load configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn init_logging(
        &self,
        flags: &CrateDebugFlags,
        config: &SpikebenchConfig,
    ) -> Result<LoggingGuard> {
        let logging = &config.logging;
        let settings = LoggingSettings {
            level: logging.level.clone(),
            format: if self.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            file_logging: logging.file_logging,
            log_dir: logging.log_dir.clone(),
            ..Default::default()
        };
        init_logging(flags, &settings)
    }

    /// Write `report` as pretty JSON if `--report-json` was given
    pub fn write_report(&self, report: &RunReport) -> Result<()> {
        if let Some(path) = &self.report_json {
            write_json(path, report)?;
        }
        Ok(())
    }
}

fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = report.to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
