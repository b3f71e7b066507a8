// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # CPU Engine
//!
//! ## Step Order
//! ```text
//! for each population:
//!     isyn  = Σ incoming  psc_init × in_syn        (then in_syn ×= psc_decay)
//!     LIF update (+ noise), collect spike list
//! for each projection:
//!     deliver source spikes of THIS step into in_syn (visible next step)
//! ```

use std::sync::Arc;
use std::time::Instant;

use spikebench_model::{NetworkDefinition, PopulationHandle};
use spikebench_npu_neural::{ConnectivityKind, Scalar};
use tracing::{debug, info, trace};

use super::population_state::PopulationState;
use super::projection_state::ProjectionState;
use crate::error::{Result, RuntimeError};
use crate::traits::{Engine, HostView, PhaseTimings, PullRequest, StateVariable};

/// CPU engine configuration
#[derive(Debug, Clone, Default)]
pub struct CpuEngineConfig {
    /// Number of worker threads (0 = Rayon's global pool)
    pub num_threads: usize,

    /// Refuse to allocate more than this many bytes (None = unlimited)
    pub memory_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Empty,
    Allocated,
    Initialized,
}

/// Multi-threaded reference implementation of [`Engine`]
pub struct CpuEngine {
    config: CpuEngineConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
    lifecycle: Lifecycle,
    dt: Scalar,
    step_count: u64,
    populations: Vec<PopulationState>,
    projections: Vec<ProjectionState>,
    /// Projection indices per target population
    incoming: Vec<Vec<usize>>,
    timings: PhaseTimings,
}

impl CpuEngine {
    /// Create an engine; builds a dedicated pool when `num_threads > 0`
    pub fn new(config: CpuEngineConfig) -> Result<Self> {
        let pool = if config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.num_threads)
                .thread_name(|i| format!("spikebench-cpu-{}", i))
                .build()
                .map_err(|e| RuntimeError::ThreadPool(e.to_string()))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self {
            config,
            pool,
            lifecycle: Lifecycle::Empty,
            dt: 0.0,
            step_count: 0,
            populations: Vec::new(),
            projections: Vec::new(),
            incoming: Vec::new(),
            timings: PhaseTimings::default(),
        })
    }

    /// Steps executed since `initialize`
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Number of worker threads actually in use
    pub fn num_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map(|p| p.current_num_threads())
            .unwrap_or_else(rayon::current_num_threads)
    }

    fn population_state(&self, pop: PopulationHandle) -> Option<&PopulationState> {
        self.populations.get(pop.index())
    }

    /// Run `f` inside the dedicated pool, if any
    fn in_pool<R: Send>(&mut self, f: impl FnOnce(&mut Self) -> R + Send) -> R {
        match self.pool.clone() {
            Some(pool) => pool.install(|| f(self)),
            None => f(self),
        }
    }

    fn estimate_bytes(network: &NetworkDefinition) -> usize {
        let populations: usize = network
            .populations()
            .iter()
            .map(|p| PopulationState::required_bytes(p.size as usize))
            .sum();
        let projections: usize = network
            .projections()
            .iter()
            .map(|p| {
                ProjectionState::required_bytes(p) + ProjectionState::connectivity_bytes_estimate(p)
            })
            .sum();
        populations + projections
    }

    fn step_inner(&mut self) {
        let dt = self.dt;
        let step = self.step_count;

        let neuron_start = Instant::now();
        for (target, pop) in self.populations.iter_mut().enumerate() {
            pop.isyn.fill(0.0);
            for &k in &self.incoming[target] {
                self.projections[k].apply_psc(&mut pop.isyn);
            }
            pop.update(dt, step);
        }
        self.timings.neuron_update += neuron_start.elapsed();

        let delivery_start = Instant::now();
        for proj in self.projections.iter_mut() {
            proj.deliver(&self.populations[proj.source].spikes);
        }
        self.timings.presynaptic_update += delivery_start.elapsed();

        if tracing::enabled!(tracing::Level::TRACE) {
            for pop in &self.populations {
                trace!(
                    target: "spikebench-npu-runtime",
                    "[STEP {}] '{}' spikes={}",
                    step,
                    pop.name,
                    pop.spikes.len()
                );
            }
        }
        self.step_count += 1;
    }
}

impl HostView for CpuEngine {
    fn current_spikes(&self, pop: PopulationHandle) -> &[u32] {
        self.population_state(pop)
            .map(|p| p.host_spikes.as_slice())
            .unwrap_or(&[])
    }

    fn state(&self, pop: PopulationHandle, var: StateVariable) -> &[Scalar] {
        self.population_state(pop)
            .map(|p| p.host_state(var))
            .unwrap_or(&[])
    }
}

impl Engine for CpuEngine {
    fn platform_name(&self) -> &'static str {
        "CPU (Rayon)"
    }

    fn allocate(&mut self, network: &NetworkDefinition) -> Result<()> {
        if self.lifecycle != Lifecycle::Empty {
            return Err(RuntimeError::InvalidOperation("engine already allocated"));
        }

        let requested = Self::estimate_bytes(network);
        if let Some(limit) = self.config.memory_limit {
            if requested > limit {
                return Err(RuntimeError::OutOfMemory {
                    requested_bytes: requested,
                    limit_bytes: Some(limit),
                });
            }
        }

        let start = Instant::now();
        let dt = network.dt();
        let mut populations = Vec::with_capacity(network.populations().len());
        for (handle, def) in network.population_handles().zip(network.populations()) {
            populations.push(PopulationState::allocate(
                def,
                network.current_sources_for(handle),
                dt,
            )?);
        }

        let mut projections = Vec::with_capacity(network.projections().len());
        let mut incoming = vec![Vec::new(); populations.len()];
        for (k, def) in network.projections().iter().enumerate() {
            let (source, target) = (def.source.index(), def.target.index());
            if source >= populations.len() || target >= populations.len() {
                return Err(RuntimeError::Unsupported(format!(
                    "projection '{}' references a population outside the network",
                    def.name
                )));
            }
            projections.push(ProjectionState::allocate(def, source, target, dt)?);
            incoming[target].push(k);
        }

        self.dt = dt;
        self.populations = populations;
        self.projections = projections;
        self.incoming = incoming;
        self.timings = PhaseTimings::default();
        self.timings.init += start.elapsed();
        self.lifecycle = Lifecycle::Allocated;

        debug!(
            target: "spikebench-npu-runtime",
            "[ALLOCATE] '{}' on {}: {} populations, {} projections, ~{:.1} MiB (threads={})",
            network.name(),
            self.platform_name(),
            self.populations.len(),
            self.projections.len(),
            requested as f64 / (1024.0 * 1024.0),
            self.num_threads()
        );
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        if self.lifecycle == Lifecycle::Empty {
            return Err(RuntimeError::InvalidOperation("initialize before allocate"));
        }

        self.in_pool(|engine| -> Result<()> {
            let start = Instant::now();
            for pop in engine.populations.iter_mut() {
                pop.initialize();
            }
            engine.timings.init += start.elapsed();

            let sparse_start = Instant::now();
            for proj in engine.projections.iter_mut() {
                proj.initialize()?;
            }
            engine.timings.init_sparse += sparse_start.elapsed();
            Ok(())
        })?;

        self.step_count = 0;
        self.lifecycle = Lifecycle::Initialized;

        for proj in &self.projections {
            // Counting procedural synapses would regenerate every row
            if let Some(c) = proj
                .connectivity()
                .filter(|c| c.kind() != ConnectivityKind::Procedural)
            {
                debug!(
                    target: "spikebench-npu-runtime",
                    "[INIT] projection '{}': {} synapses={} ({} bytes)",
                    proj.def.name,
                    proj.def.kind,
                    c.synapse_count(),
                    c.memory_bytes()
                );
            }
        }
        info!(
            target: "spikebench-npu-runtime",
            "[INIT] Engine ready: init={:.3}s init_sparse={:.3}s memory={:.1} MiB",
            self.timings.init.as_secs_f64(),
            self.timings.init_sparse.as_secs_f64(),
            self.memory_bytes() as f64 / (1024.0 * 1024.0)
        );
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        if self.lifecycle != Lifecycle::Initialized {
            return Err(RuntimeError::InvalidOperation("step before initialize"));
        }
        self.in_pool(Self::step_inner);
        Ok(())
    }

    fn pull(&mut self, pop: PopulationHandle, request: PullRequest) -> Result<()> {
        if self.lifecycle == Lifecycle::Empty {
            return Err(RuntimeError::InvalidOperation("pull before allocate"));
        }
        let state = self
            .populations
            .get_mut(pop.index())
            .ok_or(RuntimeError::UnknownPopulation(pop.raw()))?;
        match request {
            PullRequest::Spikes => state.pull_spikes(),
            PullRequest::State(var) => state.pull_state(var),
        }
        Ok(())
    }

    fn timings(&self) -> PhaseTimings {
        self.timings
    }

    fn memory_bytes(&self) -> usize {
        self.populations
            .iter()
            .map(PopulationState::memory_bytes)
            .sum::<usize>()
            + self
                .projections
                .iter()
                .map(ProjectionState::memory_bytes)
                .sum::<usize>()
    }
}
