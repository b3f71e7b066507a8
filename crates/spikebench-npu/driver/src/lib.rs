// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # spikebench Simulation Driver
//!
//! Runs a [`NetworkDefinition`](spikebench_model::NetworkDefinition) on any
//! [`Engine`](spikebench_npu_runtime::Engine) with a fixed timestep:
//!
//! - [`SimulationDriver`]: lifecycle state machine and the step loop
//! - [`SimulationClock`]: `t = steps × dt`
//! - [`recorder`]: spike and analogue recorders fed after every step
//! - [`analysis`]: spike train comparison, voltage RMSE, rate histograms
//!
//! ```ignore
//! let mut driver = SimulationDriver::new(CpuEngine::new(config)?, network);
//! driver.allocate()?;
//! driver.initialize()?;
//! let mut spikes = SpikeRecorder::new(excitatory).with_path("spikes.csv");
//! let report = driver.run(1000.0, &mut [&mut spikes])?;
//! spikes.write_cache()?;
//! ```

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod clock;
pub mod driver;
pub mod error;
pub mod recorder;
pub mod report;

pub use clock::SimulationClock;
pub use driver::{DriverState, SimulationDriver};
pub use error::{DriverError, Result};
pub use recorder::{
    AnalogueFormat, AnalogueRecorder, NeuronSelection, Recorder, RecorderError, SpikeRecorder,
};
pub use report::{RecorderSummary, RunReport, TimingReport};
