// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The immutable network handed to an engine

use serde::Serialize;
use spikebench_npu_neural::{ConnectivityKind, Scalar, SpanType};
use tracing::info;

use crate::population::{CurrentSourceDef, PopulationDef, PopulationHandle};
use crate::projection::{ProjectionDef, ProjectionHandle};

/// Output of [`ModelBuilder::build`](crate::ModelBuilder::build)
#[derive(Debug, Clone)]
pub struct NetworkDefinition {
    pub(crate) name: String,
    pub(crate) dt: Scalar,
    pub(crate) seed: u64,
    pub(crate) populations: Vec<PopulationDef>,
    pub(crate) current_sources: Vec<CurrentSourceDef>,
    pub(crate) projections: Vec<ProjectionDef>,
}

/// One projection line of a [`NetworkSummary`]
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionSummary {
    pub name: String,
    pub source: String,
    pub target: String,
    pub connectivity: ConnectivityKind,
    pub span: SpanType,
    pub threads_per_spike: u32,
    pub expected_synapses: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    pub dt: Scalar,
    pub total_neurons: u64,
    pub populations: Vec<(String, u32)>,
    pub projections: Vec<ProjectionSummary>,
}

impl NetworkDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulation timestep (ms)
    pub fn dt(&self) -> Scalar {
        self.dt
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn populations(&self) -> &[PopulationDef] {
        &self.populations
    }

    pub fn population(&self, handle: PopulationHandle) -> Option<&PopulationDef> {
        self.populations.get(handle.index())
    }

    pub fn population_by_name(&self, name: &str) -> Option<PopulationHandle> {
        self.populations
            .iter()
            .position(|p| p.name == name)
            .map(|i| PopulationHandle(i as u32))
    }

    /// Handles of every population, in creation order
    pub fn population_handles(&self) -> impl Iterator<Item = PopulationHandle> + '_ {
        (0..self.populations.len() as u32).map(PopulationHandle)
    }

    pub fn current_sources(&self) -> &[CurrentSourceDef] {
        &self.current_sources
    }

    /// Current sources injecting into `target`
    pub fn current_sources_for(
        &self,
        target: PopulationHandle,
    ) -> impl Iterator<Item = &CurrentSourceDef> + '_ {
        self.current_sources.iter().filter(move |c| c.target == target)
    }

    pub fn projections(&self) -> &[ProjectionDef] {
        &self.projections
    }

    pub fn projection(&self, handle: ProjectionHandle) -> Option<&ProjectionDef> {
        self.projections.get(handle.index())
    }

    pub fn projection_by_name(&self, name: &str) -> Option<ProjectionHandle> {
        self.projections
            .iter()
            .position(|p| p.name == name)
            .map(|i| ProjectionHandle(i as u32))
    }

    /// Projections whose target is `target`
    pub fn incoming_projections(
        &self,
        target: PopulationHandle,
    ) -> impl Iterator<Item = (ProjectionHandle, &ProjectionDef)> + '_ {
        self.projections
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.target == target)
            .map(|(i, p)| (ProjectionHandle(i as u32), p))
    }

    pub fn total_neurons(&self) -> u64 {
        self.populations.iter().map(|p| p.size as u64).sum()
    }

    pub fn expected_synapse_count(&self) -> f64 {
        self.projections
            .iter()
            .map(ProjectionDef::expected_synapse_count)
            .sum()
    }

    pub fn summary(&self) -> NetworkSummary {
        let pop_name = |h: PopulationHandle| {
            self.population(h)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        };
        NetworkSummary {
            name: self.name.clone(),
            dt: self.dt,
            total_neurons: self.total_neurons(),
            populations: self
                .populations
                .iter()
                .map(|p| (p.name.clone(), p.size))
                .collect(),
            projections: self
                .projections
                .iter()
                .map(|p| ProjectionSummary {
                    name: p.name.clone(),
                    source: pop_name(p.source),
                    target: pop_name(p.target),
                    connectivity: p.kind,
                    span: p.strategy.span,
                    threads_per_spike: p.strategy.threads_per_spike,
                    expected_synapses: p.expected_synapse_count(),
                })
                .collect(),
        }
    }

    /// Log the topology at info level
    pub fn log_summary(&self) {
        info!(
            target: "spikebench-model",
            "[NETWORK] '{}' dt={}ms populations={} neurons={} projections={} expected_synapses={:.0}",
            self.name,
            self.dt,
            self.populations.len(),
            self.total_neurons(),
            self.projections.len(),
            self.expected_synapse_count()
        );
        for p in &self.populations {
            info!(target: "spikebench-model", "  population '{}': {} neurons", p.name, p.size);
        }
        for p in &self.projections {
            info!(
                target: "spikebench-model",
                "  projection '{}': {} / {} x{} (~{:.0} synapses)",
                p.name,
                p.kind,
                p.strategy.span,
                p.strategy.threads_per_spike,
                p.expected_synapse_count()
            );
        }
    }
}
