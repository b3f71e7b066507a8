// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # spikebench-observability
//!
//! Logging setup shared by the spikebench binaries.
//!
//! Library crates only emit `tracing` events under their own target
//! (e.g. `spikebench-npu-runtime`). This crate installs the subscriber:
//! - console output through `tracing-subscriber`'s `fmt` layer
//! - an optional JSON log file per run via `tracing-appender`
//! - per-crate debug flags (`--debug-<crate>`, `--debug-all`, `SPIKEBENCH_DEBUG`)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known spikebench crate names (tracing targets) for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "spikebench",
    "spikebench-config",
    "spikebench-model",
    "spikebench-npu-neural",
    "spikebench-npu-runtime",
    "spikebench-npu-driver",
];
