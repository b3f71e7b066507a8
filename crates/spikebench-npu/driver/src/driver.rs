// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulation Driver
//!
//! Owns the engine, the network and the clock, and enforces the lifecycle:
//!
//! ```text
//! Unallocated ─allocate─► Allocated ─initialize─► Initialized ─step/run─► Running ─run─► Finished
//!                                        ▲                                                  │
//!                                        └──────────────────── initialize ◄─────────────────┘
//! ```
//!
//! Per step of [`SimulationDriver::run`]:
//! 1. `engine.step()` (neuron update, then same-step delivery)
//! 2. the clock advances, `t = steps × dt`
//! 3. pulls for every due recorder, each `(population, request)` once
//! 4. `record(t, view)` on due recorders in registration order

use std::fmt;
use std::time::{Duration, Instant};

use spikebench_model::{NetworkDefinition, PopulationHandle};
use spikebench_npu_runtime::{Engine, PullRequest};
use tracing::{debug, info, trace};

use crate::clock::SimulationClock;
use crate::error::{DriverError, Result};
use crate::recorder::Recorder;
use crate::report::{RecorderSummary, RunReport, TimingReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unallocated,
    Allocated,
    Initialized,
    Running,
    Finished,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Unallocated => "unallocated",
            DriverState::Allocated => "allocated",
            DriverState::Initialized => "initialized",
            DriverState::Running => "running",
            DriverState::Finished => "finished",
        };
        f.write_str(name)
    }
}

pub struct SimulationDriver<E: Engine> {
    engine: E,
    network: NetworkDefinition,
    clock: SimulationClock,
    state: DriverState,
}

impl<E: Engine> SimulationDriver<E> {
    pub fn new(engine: E, network: NetworkDefinition) -> Self {
        let clock = SimulationClock::new(network.dt());
        Self {
            engine,
            network,
            clock,
            state: DriverState::Unallocated,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn network(&self) -> &NetworkDefinition {
        &self.network
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    fn expect_state(&self, op: &'static str, allowed: &[DriverState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(DriverError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    pub fn allocate(&mut self) -> Result<()> {
        self.expect_state("allocate", &[DriverState::Unallocated])?;
        self.network.log_summary();
        self.engine.allocate(&self.network)?;
        self.state = DriverState::Allocated;
        info!(
            target: "spikebench-npu-driver",
            "[DRIVER] Allocated '{}' on {} ({:.1} MiB)",
            self.network.name(),
            self.engine.platform_name(),
            self.engine.memory_bytes() as f64 / (1024.0 * 1024.0)
        );
        Ok(())
    }

    /// Seed state and build connectivity; also rewinds a finished run
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_state("initialize", &[DriverState::Allocated, DriverState::Finished])?;
        self.engine.initialize()?;
        self.clock.reset();
        self.state = DriverState::Initialized;
        Ok(())
    }

    /// Advance one timestep without recording; returns the new time
    pub fn step(&mut self) -> Result<f64> {
        self.expect_state("step", &[DriverState::Initialized, DriverState::Running])?;
        self.engine.step()?;
        self.clock.advance();
        self.state = DriverState::Running;
        Ok(self.clock.t())
    }

    /// Copy device data for `pop` into the engine's host view
    pub fn pull(&mut self, pop: PopulationHandle, request: PullRequest) -> Result<()> {
        self.expect_state(
            "pull",
            &[
                DriverState::Initialized,
                DriverState::Running,
                DriverState::Finished,
            ],
        )?;
        self.engine.pull(pop, request)?;
        Ok(())
    }

    /// Step until `t >= duration`, feeding recorders after every step
    pub fn run(
        &mut self,
        duration: f64,
        recorders: &mut [&mut dyn Recorder],
    ) -> Result<RunReport> {
        self.expect_state("run", &[DriverState::Initialized, DriverState::Running])?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(DriverError::InvalidDuration(duration));
        }
        for recorder in recorders.iter() {
            let pop = recorder.population();
            if self.network.population(pop).is_none() {
                return Err(DriverError::UnknownPopulation {
                    kind: recorder.kind(),
                    handle: pop.raw(),
                });
            }
        }

        let start_steps = self.clock.steps();
        info!(
            target: "spikebench-npu-driver",
            "[DRIVER] Running '{}' for {} ms (dt={} ms, ~{} steps, {} recorders)",
            self.network.name(),
            duration,
            self.clock.dt(),
            self.clock.steps_for(duration).saturating_sub(start_steps),
            recorders.len()
        );

        let mut pulls: Vec<(PopulationHandle, PullRequest)> = Vec::new();
        let mut due: Vec<usize> = Vec::with_capacity(recorders.len());
        let wall_start = Instant::now();

        while self.clock.t() < duration {
            self.engine.step()?;
            self.clock.advance();
            self.state = DriverState::Running;

            let step = self.clock.steps();
            due.clear();
            pulls.clear();
            for (k, recorder) in recorders.iter().enumerate() {
                if recorder.is_due(step) {
                    due.push(k);
                    let pull = (recorder.population(), recorder.requirement());
                    if !pulls.contains(&pull) {
                        pulls.push(pull);
                    }
                }
            }
            for &(pop, request) in &pulls {
                self.engine.pull(pop, request)?;
            }

            let t = self.clock.t();
            for &k in &due {
                recorders[k].record(t, &self.engine)?;
            }
            trace!(
                target: "spikebench-npu-driver",
                "[STEP] t={} pulls={} recorders={}",
                t,
                pulls.len(),
                due.len()
            );
        }

        let wall_clock = wall_start.elapsed();
        self.state = DriverState::Finished;

        let report = self.report(self.clock.steps() - start_steps, wall_clock, recorders);
        for summary in &report.recorders {
            debug!(
                target: "spikebench-npu-driver",
                "[DRIVER] {} recorder on '{}': {} events",
                summary.kind,
                summary.population,
                summary.events
            );
        }
        Ok(report)
    }

    fn report(
        &self,
        steps: u64,
        wall_clock: Duration,
        recorders: &[&mut dyn Recorder],
    ) -> RunReport {
        let recorders = recorders
            .iter()
            .map(|r| RecorderSummary {
                kind: r.kind().to_string(),
                population: self
                    .network
                    .population(r.population())
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                events: r.events(),
            })
            .collect();
        RunReport {
            network: self.network.summary(),
            platform: self.engine.platform_name().to_string(),
            steps,
            simulated_ms: self.clock.t(),
            wall_clock_s: wall_clock.as_secs_f64(),
            timings: TimingReport::from(self.engine.timings()),
            memory_bytes: self.engine.memory_bytes(),
            recorders,
        }
    }
}
