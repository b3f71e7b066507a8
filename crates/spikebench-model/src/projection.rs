// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Synaptic projections between populations.

A projection binds a source and target population to one connectivity
generator, one static weight, one exponential postsynaptic kernel and one
parallelization strategy. All compatibility rules are checked here, so a
`ProjectionDef` that exists is always executable:

| Connectivity | Presynaptic span | Postsynaptic span |
|--------------|------------------|-------------------|
| Sparse       | ok               | ok                |
| Procedural   | ok               | rejected          |
| Bitmask      | rejected         | ok                |
*/

use serde::Serialize;
use spikebench_npu_neural::{
    ConnectivityGenerator, ConnectivityKind, ConnectivityRepresentation, ExpCurr,
    FixedProbability, ParallelStrategy, SpanType, StaticPulse, SynapticDelay,
};
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use crate::error::{ModelError, ModelResult};
use crate::population::{PopulationBuilder, PopulationHandle};

/// Stable index of a projection within its network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectionHandle(pub(crate) u32);

impl ProjectionHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything needed to request a projection
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSpec {
    pub name: String,
    pub source: PopulationHandle,
    pub target: PopulationHandle,
    pub rule: FixedProbability,
    pub connectivity: ConnectivityKind,
    pub weight: StaticPulse,
    pub psc: ExpCurr,
    pub strategy: ParallelStrategy,
}

impl ProjectionSpec {
    /// Sparse, postsynaptic, zero weight, TauSyn = 5 ms until overridden
    pub fn new(
        name: impl Into<String>,
        source: PopulationHandle,
        target: PopulationHandle,
        rule: FixedProbability,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            target,
            rule,
            connectivity: ConnectivityKind::Sparse,
            weight: StaticPulse::new(0.0),
            psc: ExpCurr::new(5.0),
            strategy: ParallelStrategy::postsynaptic(),
        }
    }

    pub fn connectivity(mut self, kind: ConnectivityKind) -> Self {
        self.connectivity = kind;
        self
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = StaticPulse::new(weight);
        self
    }

    pub fn tau_syn(mut self, tau_syn: f32) -> Self {
        self.psc = ExpCurr::new(tau_syn);
        self
    }

    pub fn strategy(mut self, strategy: ParallelStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A validated projection. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDef {
    pub name: String,
    pub source: PopulationHandle,
    pub target: PopulationHandle,
    pub kind: ConnectivityKind,
    pub generator: ConnectivityGenerator,
    pub weight: StaticPulse,
    pub psc: ExpCurr,
    pub strategy: ParallelStrategy,
    pub delay: SynapticDelay,
}

impl ProjectionDef {
    /// Realize the bound connectivity representation
    pub fn realize(&self) -> ConnectivityRepresentation {
        self.generator.generate(self.kind)
    }

    pub fn expected_synapse_count(&self) -> f64 {
        self.generator.expected_synapse_count()
    }
}

/// Is `kind` executable with `span`
pub fn span_supports(kind: ConnectivityKind, span: SpanType) -> bool {
    !matches!(
        (kind, span),
        (ConnectivityKind::Procedural, SpanType::Postsynaptic)
            | (ConnectivityKind::Bitmask, SpanType::Presynaptic)
    )
}

#[derive(Debug, Clone)]
pub struct ProjectionBuilder {
    network_seed: u64,
    projections: Vec<ProjectionDef>,
}

impl ProjectionBuilder {
    pub fn new(network_seed: u64) -> Self {
        Self {
            network_seed,
            projections: Vec::new(),
        }
    }

    /// Validate `spec` against `populations` and bind its connectivity
    pub fn add_projection(
        &mut self,
        populations: &PopulationBuilder,
        spec: ProjectionSpec,
    ) -> ModelResult<ProjectionHandle> {
        let ProjectionSpec {
            name,
            source,
            target,
            rule,
            connectivity,
            weight,
            psc,
            strategy,
        } = spec;

        let unknown = |handle: PopulationHandle| ModelError::UnknownPopulation {
            handle: handle.raw(),
            referenced_by: name.clone(),
        };
        let pre = populations.population(source).ok_or_else(|| unknown(source))?;
        let post = populations.population(target).ok_or_else(|| unknown(target))?;

        if !span_supports(connectivity, strategy.span) {
            return Err(ModelError::IncompatibleStrategy {
                projection: name,
                kind: connectivity,
                span: strategy.span,
            });
        }
        strategy.validate().map_err(ModelError::invalid(&name))?;
        weight.validate().map_err(ModelError::invalid(&name))?;
        psc.validate().map_err(ModelError::invalid(&name))?;
        if rule.exclude_autapses && source != target {
            return Err(ModelError::AutapseAcrossPopulations(name));
        }

        let seed = xxh64(name.as_bytes(), self.network_seed);
        let generator = ConnectivityGenerator::new(pre.size, post.size, rule, seed)
            .map_err(ModelError::invalid(&name))?;

        let handle = ProjectionHandle(self.projections.len() as u32);
        debug!(
            target: "spikebench-model",
            "[PROJECTION] '{}' {}({}) -> {}({}) p={} {} {}x{} w={} tau_syn={} expected_synapses={:.0}",
            name,
            pre.name,
            pre.size,
            post.name,
            post.size,
            rule.probability,
            connectivity,
            strategy.span,
            strategy.threads_per_spike,
            weight.weight,
            psc.tau_syn,
            generator.expected_synapse_count()
        );
        self.projections.push(ProjectionDef {
            name,
            source,
            target,
            kind: connectivity,
            generator,
            weight,
            psc,
            strategy,
            delay: SynapticDelay::NoDelay,
        });
        Ok(handle)
    }

    pub fn projection(&self, handle: ProjectionHandle) -> Option<&ProjectionDef> {
        self.projections.get(handle.index())
    }

    pub fn projections(&self) -> &[ProjectionDef] {
        &self.projections
    }

    pub(crate) fn into_projections(self) -> Vec<ProjectionDef> {
        self.projections
    }
}
