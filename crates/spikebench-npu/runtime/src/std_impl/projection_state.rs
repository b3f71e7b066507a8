// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Projection State and Spike Delivery
//!
//! ## Span types on the CPU
//! ```text
//! Presynaptic:  one task per (spike, row part)     → atomic per-target counters
//!               a row is split into threads_per_spike parts
//! Postsynaptic: one task per block of targets      → private counters per block
//!               every task scans all spikes, keeping only its targets
//! ```
//! Both paths end with `in_syn[j] += weight × count[j]`.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use spikebench_model::ProjectionDef;
use spikebench_npu_neural::{
    BitmaskConnectivity, ConnectivityGenerator, ConnectivityKind, ConnectivityRepresentation,
    Scalar, SpanType, SparseConnectivity,
};

use super::{try_filled, try_with_capacity, TARGET_BLOCK};
use crate::error::{Result, RuntimeError};

pub struct ProjectionState {
    pub def: ProjectionDef,
    pub source: usize,
    pub target: usize,
    /// Bound at initialization
    connectivity: Option<ConnectivityRepresentation>,
    /// Postsynaptic current accumulator, one per target neuron
    pub in_syn: Vec<Scalar>,
    /// Per-target spike counters (presynaptic span only)
    counts: Vec<AtomicU32>,
    pub psc_init: Scalar,
    pub psc_decay: Scalar,
}

impl ProjectionState {
    /// Bytes that `allocate` will reserve, excluding connectivity
    pub fn required_bytes(def: &ProjectionDef) -> usize {
        let post = def.generator.post_size() as usize;
        let counters = match def.strategy.span {
            SpanType::Presynaptic => post * core::mem::size_of::<AtomicU32>(),
            SpanType::Postsynaptic => 0,
        };
        post * core::mem::size_of::<Scalar>() + counters
    }

    /// Estimated bytes of the materialized connectivity
    pub fn connectivity_bytes_estimate(def: &ProjectionDef) -> usize {
        let pre = def.generator.pre_size() as usize;
        let post = def.generator.post_size() as usize;
        match def.kind {
            ConnectivityKind::Procedural => 0,
            ConnectivityKind::Bitmask => (pre * post).div_ceil(64) * 8,
            ConnectivityKind::Sparse => {
                (pre + 1) * core::mem::size_of::<usize>()
                    + def.expected_synapse_count().ceil() as usize * core::mem::size_of::<u32>()
            }
        }
    }

    pub fn allocate(def: &ProjectionDef, source: usize, target: usize, dt: Scalar) -> Result<Self> {
        let post = def.generator.post_size() as usize;
        let counts = match def.strategy.span {
            SpanType::Presynaptic => {
                let mut counts = Vec::new();
                counts.try_reserve_exact(post).map_err(|_| RuntimeError::OutOfMemory {
                    requested_bytes: post * core::mem::size_of::<AtomicU32>(),
                    limit_bytes: None,
                })?;
                counts.extend((0..post).map(|_| AtomicU32::new(0)));
                counts
            }
            SpanType::Postsynaptic => Vec::new(),
        };
        Ok(Self {
            def: def.clone(),
            source,
            target,
            connectivity: None,
            in_syn: try_filled(post, 0.0)?,
            counts,
            psc_init: def.psc.init(dt),
            psc_decay: def.psc.decay(dt),
        })
    }

    /// Zero synaptic state and build the connectivity representation
    pub fn initialize(&mut self) -> Result<()> {
        self.in_syn.fill(0.0);
        for c in &self.counts {
            c.store(0, Ordering::Relaxed);
        }
        let generator = self.def.generator;
        // Free the previous representation before building the next
        self.connectivity = None;
        self.connectivity = Some(match self.def.kind {
            ConnectivityKind::Sparse => ConnectivityRepresentation::Sparse(build_sparse(&generator)?),
            ConnectivityKind::Bitmask => {
                ConnectivityRepresentation::Bitmask(build_bitmask(&generator)?)
            }
            ConnectivityKind::Procedural => generator.generate(ConnectivityKind::Procedural),
        });
        Ok(())
    }

    pub fn connectivity(&self) -> Option<&ConnectivityRepresentation> {
        self.connectivity.as_ref()
    }

    pub fn memory_bytes(&self) -> usize {
        Self::required_bytes(&self.def)
            + self
                .connectivity
                .as_ref()
                .map(ConnectivityRepresentation::memory_bytes)
                .unwrap_or(0)
    }

    /// Add `psc_init × in_syn` to `isyn`, then decay `in_syn`
    pub fn apply_psc(&mut self, isyn: &mut [Scalar]) {
        let (init, decay) = (self.psc_init, self.psc_decay);
        isyn.par_iter_mut()
            .zip(self.in_syn.par_iter_mut())
            .for_each(|(i, g)| {
                *i += init * *g;
                *g *= decay;
            });
    }

    /// Deliver this step's presynaptic spikes into `in_syn`
    pub fn deliver(&mut self, spikes: &[u32]) {
        if spikes.is_empty() {
            return;
        }
        let Some(connectivity) = self.connectivity.as_ref() else {
            return;
        };
        let weight = self.def.weight.weight;
        match self.def.strategy.span {
            SpanType::Presynaptic => {
                let tps = self.def.strategy.threads_per_spike.max(1) as usize;
                deliver_presynaptic(connectivity, spikes, tps, &self.counts);
                self.in_syn
                    .par_iter_mut()
                    .zip(self.counts.par_iter())
                    .for_each(|(g, c)| {
                        let n = c.swap(0, Ordering::Relaxed);
                        if n > 0 {
                            *g += weight * n as Scalar;
                        }
                    });
            }
            SpanType::Postsynaptic => {
                deliver_postsynaptic(connectivity, spikes, weight, &mut self.in_syn);
            }
        }
    }
}

fn deliver_presynaptic(
    connectivity: &ConnectivityRepresentation,
    spikes: &[u32],
    threads_per_spike: usize,
    counts: &[AtomicU32],
) {
    let bump = |j: u32| {
        counts[j as usize].fetch_add(1, Ordering::Relaxed);
    };
    match connectivity {
        ConnectivityRepresentation::Sparse(sparse) => {
            spikes
                .par_iter()
                .flat_map(|&i| {
                    let row = sparse.row(i);
                    let part = row.len().div_ceil(threads_per_spike).max(1);
                    row.par_chunks(part)
                })
                .for_each(|part| part.iter().copied().for_each(bump));
        }
        // Regenerated rows are a single sequential stream per spike
        other => {
            spikes
                .par_iter()
                .for_each(|&i| other.row(i).for_each(bump));
        }
    }
}

fn deliver_postsynaptic(
    connectivity: &ConnectivityRepresentation,
    spikes: &[u32],
    weight: Scalar,
    in_syn: &mut [Scalar],
) {
    in_syn
        .par_chunks_mut(TARGET_BLOCK)
        .enumerate()
        .for_each(|(block, g)| {
            let lo = (block * TARGET_BLOCK) as u32;
            let hi = lo + g.len() as u32;
            let mut counts = vec![0u32; g.len()];
            for &i in spikes {
                match connectivity {
                    ConnectivityRepresentation::Sparse(sparse) => {
                        let row = sparse.row(i);
                        let start = row.partition_point(|&j| j < lo);
                        for &j in row[start..].iter().take_while(|&&j| j < hi) {
                            counts[(j - lo) as usize] += 1;
                        }
                    }
                    ConnectivityRepresentation::Bitmask(mask) => {
                        for j in mask.row_range(i, lo, hi) {
                            counts[(j - lo) as usize] += 1;
                        }
                    }
                    ConnectivityRepresentation::Procedural(procedural) => {
                        for j in procedural
                            .row(i)
                            .skip_while(|&j| j < lo)
                            .take_while(|&j| j < hi)
                        {
                            counts[(j - lo) as usize] += 1;
                        }
                    }
                }
            }
            for (g, c) in g.iter_mut().zip(counts) {
                if c > 0 {
                    *g += weight * c as Scalar;
                }
            }
        });
}

/// CSR build that reports allocation failure instead of aborting.
///
/// Rows are independent streams, so they are generated in parallel; the
/// flat buffers are reserved once the total length is known.
pub(crate) fn build_sparse(generator: &ConnectivityGenerator) -> Result<SparseConnectivity> {
    let pre = generator.pre_size();
    let rows: Vec<Vec<u32>> = (0..pre)
        .into_par_iter()
        .map(|i| generator.row(i).collect())
        .collect();
    let total: usize = rows.iter().map(Vec::len).sum();

    let mut row_offsets = try_with_capacity::<usize>(pre as usize + 1)?;
    let mut targets = try_with_capacity::<u32>(total)?;
    row_offsets.push(0);
    for row in rows {
        targets.extend_from_slice(&row);
        row_offsets.push(targets.len());
    }
    SparseConnectivity::from_csr(pre, generator.post_size(), row_offsets, targets)
        .ok_or(RuntimeError::InvalidOperation("inconsistent CSR row offsets"))
}

/// Bitmask build that reports allocation failure instead of aborting
pub(crate) fn build_bitmask(generator: &ConnectivityGenerator) -> Result<BitmaskConnectivity> {
    let (pre, post) = (generator.pre_size(), generator.post_size());
    let words = try_filled(BitmaskConnectivity::word_count(pre, post), 0u64)?;
    let mut mask = BitmaskConnectivity::with_words(pre, post, words)
        .ok_or(RuntimeError::InvalidOperation("bitmask storage size mismatch"))?;
    mask.populate(generator);
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikebench_model::{ModelBuilder, NeuronInit, ProjectionSpec};
    use spikebench_npu_neural::{FixedProbability, LifParameters, ParallelStrategy};

    fn projection(kind: ConnectivityKind, strategy: ParallelStrategy, post: u32) -> ProjectionState {
        let mut model = ModelBuilder::new("t", 1.0, 5);
        let params = LifParameters::default();
        let a = model
            .add_population("A", 300, params, NeuronInit::resting_at(-55.0))
            .unwrap();
        let b = model
            .add_population("B", post, params, NeuronInit::resting_at(-55.0))
            .unwrap();
        model
            .add_projection(
                ProjectionSpec::new("AB", a, b, FixedProbability::new(0.3))
                    .connectivity(kind)
                    .strategy(strategy)
                    .weight(0.5)
                    .tau_syn(5.0),
            )
            .unwrap();
        let net = model.build().unwrap();
        let mut state = ProjectionState::allocate(&net.projections()[0], 0, 1, 1.0).unwrap();
        state.initialize().unwrap();
        state
    }

    #[test]
    fn test_all_paths_deliver_identically() {
        let post = 2 * TARGET_BLOCK as u32 + 100;
        let spikes: Vec<u32> = (0..300).step_by(7).collect();
        let mut reference: Option<Vec<Scalar>> = None;
        for (kind, strategy) in [
            (ConnectivityKind::Sparse, ParallelStrategy::postsynaptic()),
            (ConnectivityKind::Sparse, ParallelStrategy::presynaptic(1)),
            (ConnectivityKind::Sparse, ParallelStrategy::presynaptic(8)),
            (ConnectivityKind::Procedural, ParallelStrategy::presynaptic(8)),
            (ConnectivityKind::Bitmask, ParallelStrategy::postsynaptic()),
        ] {
            let mut state = projection(kind, strategy, post);
            state.deliver(&spikes);
            match &reference {
                None => reference = Some(state.in_syn.clone()),
                Some(r) => assert_eq!(r, &state.in_syn, "{} / {}", kind, strategy.span),
            }
        }
        let r = reference.unwrap();
        assert!(r.iter().any(|&g| g > 0.0));
    }

    #[test]
    fn test_delivery_matches_row_counts() {
        let mut state = projection(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic(), 50);
        let spikes = [3u32, 10, 200];
        state.deliver(&spikes);
        let conn = state.connectivity().unwrap();
        for j in 0..50 {
            let n = spikes.iter().filter(|&&i| conn.is_connected(i, j)).count();
            assert_eq!(state.in_syn[j as usize], 0.5 * n as Scalar);
        }
    }

    #[test]
    fn test_psc_readout_and_decay() {
        let mut state = projection(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic(), 4);
        state.in_syn.fill(2.0);
        let mut isyn = vec![1.0; 4];
        state.apply_psc(&mut isyn);
        let init = state.psc_init;
        let decay = state.psc_decay;
        assert!(isyn.iter().all(|&i| (i - (1.0 + 2.0 * init)).abs() < 1e-6));
        assert!(state.in_syn.iter().all(|&g| (g - 2.0 * decay).abs() < 1e-6));
    }

    #[test]
    fn test_fallible_builds_match_generated_connectivity() {
        let generator = ConnectivityGenerator::new(120, 90, FixedProbability::new(0.2), 11).unwrap();
        assert_eq!(
            build_sparse(&generator).unwrap(),
            SparseConnectivity::generate(&generator)
        );
        assert_eq!(
            build_bitmask(&generator).unwrap(),
            BitmaskConnectivity::generate(&generator)
        );
    }

    #[test]
    fn test_oversized_bitmask_reports_out_of_memory() {
        let generator =
            ConnectivityGenerator::new(u32::MAX, u32::MAX, FixedProbability::new(0.0), 1).unwrap();
        let err = build_bitmask(&generator).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::OutOfMemory {
                limit_bytes: None,
                ..
            }
        ));
    }

    #[test]
    fn test_memory_accounting() {
        let sparse = projection(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic(), 100);
        let procedural = projection(ConnectivityKind::Procedural, ParallelStrategy::presynaptic(2), 100);
        // Procedural stores no connectivity but carries presynaptic counters
        assert_eq!(procedural.memory_bytes(), 100 * 4 + 100 * 4);
        assert!(sparse.memory_bytes() > 100 * 4);
    }
}
