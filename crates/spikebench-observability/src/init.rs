// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! With file logging enabled, each run gets its own folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── spikebench.log   (JSON, one event per line)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps the file writer alive; logs are flushed when dropped
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder of this run's log file, if file logging is on
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

/// Install the global subscriber
///
/// Debug flags raise single crates to `debug` on top of `config.level`.
/// Without flags, a set `RUST_LOG` takes precedence over `config.level`.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_filter(debug_flags, &config.level)?;

    let mut layers = Vec::new();
    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let console = match config.format {
        LogFormat::Text => console.with_filter(filter.clone()).boxed(),
        LogFormat::Json => console.json().with_filter(filter.clone()).boxed(),
    };
    layers.push(console);

    let mut file_guard = None;
    let mut run_dir = None;
    if config.file_logging {
        let run_folder = create_run_folder(&config.log_dir)?;
        cleanup_old_runs(&config.log_dir, config.retention_runs)?;

        let appender = tracing_appender::rolling::never(&run_folder, "spikebench.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(filter)
            .boxed();
        layers.push(file_layer);
        file_guard = Some(guard);
        run_dir = Some(run_folder);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        run_dir,
    })
}

fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    if !debug_flags.any_enabled() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

fn create_run_folder(base: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format(RUN_FORMAT);
    let run_folder = base.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

/// Run folders under `base`, oldest first
fn list_runs(base: &Path) -> Result<Vec<(PathBuf, NaiveDateTime)>> {
    let mut runs = Vec::new();
    if !base.exists() {
        return Ok(runs);
    }
    for entry in std::fs::read_dir(base)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_FORMAT).ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }
    runs.sort_by_key(|(_, stamp)| *stamp);
    Ok(runs)
}

/// Keep only the `keep` most recent run folders
fn cleanup_old_runs(base: &Path, keep: usize) -> Result<()> {
    let runs = list_runs(base)?;
    let excess = runs.len().saturating_sub(keep.max(1));
    for (path, _) in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            tracing::warn!(
                target: "spikebench-observability",
                "Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}
