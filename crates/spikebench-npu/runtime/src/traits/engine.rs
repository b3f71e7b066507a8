// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine abstraction traits
//!
//! The simulation driver never sees how an engine stores state. It drives
//! the lifecycle through [`Engine`] and reads host copies through
//! [`HostView`]:
//!
//! ```text
//! allocate(network) ─► initialize() ─► step() ─► pull(pop, request) ─► HostView
//!                                        ▲                               │
//!                                        └───────────── next step ◄──────┘
//! ```
//!
//! - **Device vs host**: `step` only touches device state. Host copies change
//!   only on `pull`, so recorders see exactly what was pulled.
//! - **Barrier**: `step` returns after every neuron update and every
//!   synaptic delivery of that step has completed.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};
use spikebench_model::{NetworkDefinition, PopulationHandle};
use spikebench_npu_neural::Scalar;

use crate::error::Result;

/// Per-neuron state variable that can be pulled to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateVariable {
    /// Membrane potential (mV)
    V,
    /// Remaining refractory time (ms)
    RefracTime,
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateVariable::V => write!(f, "V"),
            StateVariable::RefracTime => write!(f, "RefracTime"),
        }
    }
}

/// What to copy from device to host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequest {
    /// The current-step spike list
    Spikes,
    /// One state variable of every neuron
    State(StateVariable),
}

/// Cumulative engine phase timings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    /// State initialization
    pub init: Duration,
    /// Connectivity materialization
    pub init_sparse: Duration,
    /// Neuron updates (including PSC readout and noise)
    pub neuron_update: Duration,
    /// Spike delivery
    pub presynaptic_update: Duration,
}

/// Host-side copies of pulled engine data
pub trait HostView {
    /// Neuron indices (within `pop`) that spiked in the last pulled step, ascending
    fn current_spikes(&self, pop: PopulationHandle) -> &[u32];

    /// Last pulled values of `var` for every neuron of `pop`
    fn state(&self, pop: PopulationHandle, var: StateVariable) -> &[Scalar];

    /// Number of neurons in the last pulled spike list
    fn spike_count(&self, pop: PopulationHandle) -> usize {
        self.current_spikes(pop).len()
    }
}

/// The external execution engine
///
/// # Example
///
/// ```ignore
/// let mut engine = CpuEngine::new(CpuEngineConfig::default())?;
/// engine.allocate(&network)?;
/// engine.initialize()?;
/// engine.step()?;
/// engine.pull(excitatory, PullRequest::Spikes)?;
/// let spikes = engine.current_spikes(excitatory);
/// ```
pub trait Engine: HostView + Send {
    /// Platform name for logging/debugging
    fn platform_name(&self) -> &'static str;

    /// Reserve all state for `network`
    fn allocate(&mut self, network: &NetworkDefinition) -> Result<()>;

    /// Seed neuron state, zero synaptic state, materialize connectivity
    fn initialize(&mut self) -> Result<()>;

    /// Advance every population and projection by one timestep
    fn step(&mut self) -> Result<()>;

    /// Copy device data for `pop` to the host view
    fn pull(&mut self, pop: PopulationHandle, request: PullRequest) -> Result<()>;

    /// Cumulative phase timings since allocation
    fn timings(&self) -> PhaseTimings;

    /// Bytes currently reserved for network state
    fn memory_bytes(&self) -> usize;
}
