// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Observability configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Console log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level for every target (trace, debug, info, warn, error)
    pub level: String,

    pub format: LogFormat,

    /// Write a JSON log file under `log_dir/run_<timestamp>/`
    pub file_logging: bool,

    pub log_dir: PathBuf,

    /// Keep at most this many run folders
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_runs: 10,
        }
    }
}
