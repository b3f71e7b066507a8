// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run report returned by [`SimulationDriver::run`](crate::SimulationDriver::run)

use serde::Serialize;
use spikebench_model::NetworkSummary;
use spikebench_npu_runtime::PhaseTimings;
use tracing::info;

/// Engine phase timings in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingReport {
    pub init_s: f64,
    pub init_sparse_s: f64,
    pub neuron_update_s: f64,
    pub presynaptic_update_s: f64,
}

impl From<PhaseTimings> for TimingReport {
    fn from(t: PhaseTimings) -> Self {
        Self {
            init_s: t.init.as_secs_f64(),
            init_sparse_s: t.init_sparse.as_secs_f64(),
            neuron_update_s: t.neuron_update.as_secs_f64(),
            presynaptic_update_s: t.presynaptic_update.as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecorderSummary {
    pub kind: String,
    pub population: String,
    pub events: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub network: NetworkSummary,
    pub platform: String,
    /// Steps taken by this run
    pub steps: u64,
    /// Clock time at the end of the run
    pub simulated_ms: f64,
    /// Wall clock of the step loop, including pulls and recording
    pub wall_clock_s: f64,
    pub timings: TimingReport,
    pub memory_bytes: usize,
    pub recorders: Vec<RecorderSummary>,
}

impl RunReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Simulated milliseconds per wall clock second
    pub fn realtime_factor(&self) -> f64 {
        if self.wall_clock_s > 0.0 {
            self.simulated_ms / 1000.0 / self.wall_clock_s
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!(
            target: "spikebench-npu-driver",
            "[REPORT] '{}' on {}: {} steps, {} ms simulated in {:.3}s (x{:.2} realtime)",
            self.network.name,
            self.platform,
            self.steps,
            self.simulated_ms,
            self.wall_clock_s,
            self.realtime_factor()
        );
        info!(
            target: "spikebench-npu-driver",
            "[REPORT] init={:.3}s init_sparse={:.3}s neuron_update={:.3}s presynaptic_update={:.3}s",
            self.timings.init_s,
            self.timings.init_sparse_s,
            self.timings.neuron_update_s,
            self.timings.presynaptic_update_s
        );
        for r in &self.recorders {
            info!(
                target: "spikebench-npu-driver",
                "[REPORT] {} recorder '{}': {} events",
                r.kind,
                r.population,
                r.events
            );
        }
    }
}
