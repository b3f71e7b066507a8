// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Recorders
//!
//! A recorder observes one population. After every step the driver pulls
//! what the due recorders need, then calls `record(t, view)` on each of them
//! in registration order.
//!
//! - [`SpikeRecorder`]: buffers `(t, neuron_id)` in memory, writes once
//! - [`AnalogueRecorder`]: samples `V` or `RefracTime` into a buffer or sink

pub mod analogue;
pub mod spike;

use std::path::PathBuf;

use spikebench_model::PopulationHandle;
use spikebench_npu_runtime::{HostView, PullRequest};

pub use analogue::{AnalogueFormat, AnalogueRecorder, NeuronSelection};
pub use spike::SpikeRecorder;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("No output path configured for {0} recorder")]
    NoOutputPath(&'static str),

    #[error("Neuron index {index} out of range for population of {size}")]
    IndexOutOfRange { index: u32, size: usize },

    #[error("Sample interval must be >= 1")]
    InvalidSampleInterval,
}

impl RecorderError {
    pub(crate) fn io(path: Option<PathBuf>) -> impl FnOnce(std::io::Error) -> RecorderError {
        move |source| RecorderError::Io { path, source }
    }
}

/// Observer of one population, fed after every step
pub trait Recorder {
    /// Population this recorder observes
    fn population(&self) -> PopulationHandle;

    /// Data that must be pulled before `record`
    fn requirement(&self) -> PullRequest;

    /// Whether step number `step` (1-based, after it executed) is sampled
    fn is_due(&self, _step: u64) -> bool {
        true
    }

    /// Capture the pulled data at time `t`
    fn record(&mut self, t: f64, view: &dyn HostView) -> Result<(), RecorderError>;

    /// Short kind name for reports
    fn kind(&self) -> &'static str;

    /// Events (spikes or samples) captured so far
    fn events(&self) -> u64;
}
