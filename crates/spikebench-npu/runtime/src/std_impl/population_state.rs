// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Per-population neuron state (System-of-Arrays)

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use spikebench_model::{CurrentSourceDef, NeuronInit, PopulationDef};
use spikebench_npu_neural::{GaussianNoise, LifDerived, LifParameters, NeuronModel, Scalar};
use xxhash_rust::xxh64::xxh64;

use super::{try_filled, try_with_capacity, NEURON_CHUNK};
use crate::error::Result;
use crate::traits::StateVariable;

/// Noise injected into one population
#[derive(Debug, Clone, Copy)]
pub struct NoiseInput {
    pub noise: GaussianNoise,
    pub seed: u64,
}

impl NoiseInput {
    /// Stream for one chunk of one step
    #[inline]
    fn chunk_rng(&self, step: u64, chunk: usize) -> ChaCha8Rng {
        let mut key = [0u8; 16];
        key[..8].copy_from_slice(&step.to_le_bytes());
        key[8..].copy_from_slice(&(chunk as u64).to_le_bytes());
        ChaCha8Rng::seed_from_u64(xxh64(&key, self.seed))
    }
}

/// Device and host buffers of one LIF population
pub struct PopulationState {
    pub name: String,
    pub size: usize,
    params: LifParameters,
    derived: LifDerived,
    init: NeuronInit,
    seed: u64,
    noise: Vec<NoiseInput>,

    // Device state
    pub v: Vec<Scalar>,
    pub refrac_time: Vec<Scalar>,
    /// Summed input current of the current step
    pub isyn: Vec<Scalar>,
    /// Neurons that spiked in the current step, ascending
    pub spikes: Vec<u32>,

    // Host mirrors (updated by pulls only)
    pub host_spikes: Vec<u32>,
    pub host_v: Vec<Scalar>,
    pub host_refrac_time: Vec<Scalar>,
}

impl PopulationState {
    /// Bytes that `allocate` will reserve for a population of `size`
    pub fn required_bytes(size: usize) -> usize {
        // v, refrac, isyn, host_v, host_refrac (f32) + spikes, host_spikes (u32)
        size * (5 * core::mem::size_of::<Scalar>() + 2 * core::mem::size_of::<u32>())
    }

    pub fn allocate<'a>(
        def: &PopulationDef,
        sources: impl Iterator<Item = &'a CurrentSourceDef>,
        dt: Scalar,
    ) -> Result<Self> {
        let size = def.size as usize;
        Ok(Self {
            name: def.name.clone(),
            size,
            params: def.params,
            derived: def.params.derive(dt),
            init: def.init,
            seed: def.seed,
            noise: sources
                .map(|s| NoiseInput {
                    noise: s.noise,
                    seed: s.seed,
                })
                .collect(),
            v: try_filled(size, 0.0)?,
            refrac_time: try_filled(size, 0.0)?,
            isyn: try_filled(size, 0.0)?,
            spikes: try_with_capacity(size)?,
            host_spikes: try_with_capacity(size)?,
            host_v: try_filled(size, 0.0)?,
            host_refrac_time: try_filled(size, 0.0)?,
        })
    }

    pub fn memory_bytes(&self) -> usize {
        Self::required_bytes(self.size)
    }

    /// Draw initial state; same seed, same values
    pub fn initialize(&mut self) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for v in self.v.iter_mut() {
            *v = self.init.v.sample(&mut rng);
        }
        for r in self.refrac_time.iter_mut() {
            *r = self.init.refrac_time.sample(&mut rng);
        }
        self.isyn.fill(0.0);
        self.spikes.clear();
        self.host_spikes.clear();
        self.host_v.copy_from_slice(&self.v);
        self.host_refrac_time.copy_from_slice(&self.refrac_time);
    }

    /// LIF update of every neuron; `isyn` must already hold the PSC input
    pub fn update(&mut self, dt: Scalar, step: u64) {
        let params = self.params;
        let derived = self.derived;
        let noise = &self.noise;

        let fired: Vec<Vec<u32>> = self
            .v
            .par_chunks_mut(NEURON_CHUNK)
            .zip(self.refrac_time.par_chunks_mut(NEURON_CHUNK))
            .zip(self.isyn.par_chunks(NEURON_CHUNK))
            .enumerate()
            .map(|(chunk, ((v, refrac), isyn))| {
                let mut streams: Vec<(GaussianNoise, ChaCha8Rng)> = noise
                    .iter()
                    .map(|n| (n.noise, n.chunk_rng(step, chunk)))
                    .collect();
                let base = (chunk * NEURON_CHUNK) as u32;
                let mut local = Vec::new();
                for k in 0..v.len() {
                    let mut input = isyn[k];
                    for (n, rng) in streams.iter_mut() {
                        input += n.sample(rng);
                    }
                    if params.update(&derived, &mut v[k], &mut refrac[k], input, dt) {
                        local.push(base + k as u32);
                    }
                }
                local
            })
            .collect();

        self.spikes.clear();
        for chunk in fired {
            self.spikes.extend_from_slice(&chunk);
        }
    }

    pub fn pull_spikes(&mut self) {
        self.host_spikes.clear();
        self.host_spikes.extend_from_slice(&self.spikes);
    }

    pub fn pull_state(&mut self, var: StateVariable) {
        match var {
            StateVariable::V => self.host_v.copy_from_slice(&self.v),
            StateVariable::RefracTime => self.host_refrac_time.copy_from_slice(&self.refrac_time),
        }
    }

    pub fn host_state(&self, var: StateVariable) -> &[Scalar] {
        match var {
            StateVariable::V => &self.host_v,
            StateVariable::RefracTime => &self.host_refrac_time,
        }
    }
}
