// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # spikebench Engine Abstraction
//!
//! This crate provides:
//! - **Traits** (always available): [`Engine`], [`HostView`]
//! - **CPU Implementation** (behind `std` feature): [`CpuEngine`], a
//!   multi-threaded reference engine built on Rayon
//!
//! ## Features
//!
//! - `default` = `["std"]`
//! - `std` = CPU engine (Vec-based state, parallel neuron update and delivery)
//!
//! ## Usage
//!
//! ```ignore
//! use spikebench_npu_runtime::{CpuEngine, CpuEngineConfig, Engine};
//! let mut engine = CpuEngine::new(CpuEngineConfig::default())?;
//! engine.allocate(&network)?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod traits;

pub use traits::{Engine, HostView, PhaseTimings, PullRequest, Result, RuntimeError, StateVariable};

/// CPU reference engine (behind "std" feature)
#[cfg(feature = "std")]
pub mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::{CpuEngine, CpuEngineConfig};
