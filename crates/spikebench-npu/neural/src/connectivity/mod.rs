// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Fixed-Probability Connectivity
//!
//! Every ordered pair `(i, j)` of a projection is connected independently
//! with probability `p`. With autapse exclusion, `(i, i)` never is.
//!
//! ## Row generation
//!
//! ```text
//! row seed   = xxh64(i as little-endian bytes, projection seed)
//! row stream = ChaCha8(row seed)
//! targets    = geometric skipping over 0..post_size:
//!              j_next = j_prev + 1 + floor(ln(u) / ln(1 - p)),  u ~ U(0, 1]
//! ```
//!
//! All three representations are built from the same row generator, so a
//! sparse, bitmask or procedural projection with the same seed contains
//! exactly the same pairs. Procedural connectivity stores nothing and simply
//! re-runs the generator for a row whenever it is queried.

pub mod bitmask;
pub mod procedural;
pub mod row;
pub mod sparse;

use core::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::types::{NeuralError, Result};

pub use bitmask::{BitRowIter, BitmaskConnectivity};
pub use procedural::ProceduralConnectivity;
pub use row::RowIter;
pub use sparse::SparseConnectivity;

/// Storage strategy of a projection's connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityKind {
    /// Explicit per-row target lists, materialized at initialization
    Sparse,

    /// Regenerated on demand from the rule and seed, nothing stored
    Procedural,

    /// One bit per possible (pre, post) pair
    Bitmask,
}

impl fmt::Display for ConnectivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityKind::Sparse => write!(f, "sparse"),
            ConnectivityKind::Procedural => write!(f, "procedural"),
            ConnectivityKind::Bitmask => write!(f, "bitmask"),
        }
    }
}

/// Fixed-probability connection rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedProbability {
    /// Probability of each pair being connected, in [0, 1]
    pub probability: f64,

    /// Never connect neuron `i` to neuron `i` (same-population projections)
    pub exclude_autapses: bool,
}

impl FixedProbability {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            exclude_autapses: false,
        }
    }

    pub fn no_autapse(probability: f64) -> Self {
        Self {
            probability,
            exclude_autapses: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(NeuralError::InvalidProbability(self.probability));
        }
        Ok(())
    }
}

/// Deterministic row generator for one projection.
///
/// Construction is where the rule is validated; once a generator exists
/// every representation built from it is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityGenerator {
    pre_size: u32,
    post_size: u32,
    rule: FixedProbability,
    seed: u64,
}

impl ConnectivityGenerator {
    pub fn new(pre_size: u32, post_size: u32, rule: FixedProbability, seed: u64) -> Result<Self> {
        rule.validate()?;
        if rule.exclude_autapses && pre_size != post_size {
            return Err(NeuralError::AutapseShapeMismatch {
                pre_size,
                post_size,
            });
        }
        Ok(Self {
            pre_size,
            post_size,
            rule,
            seed,
        })
    }

    pub fn pre_size(&self) -> u32 {
        self.pre_size
    }

    pub fn post_size(&self) -> u32 {
        self.post_size
    }

    pub fn rule(&self) -> FixedProbability {
        self.rule
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Targets of presynaptic neuron `pre`, ascending
    pub fn row(&self, pre: u32) -> RowIter {
        let row_seed = xxh64(&pre.to_le_bytes(), self.seed);
        let skip = self.rule.exclude_autapses.then_some(pre);
        RowIter::new(row_seed, self.rule.probability, self.post_size, skip)
    }

    /// Expected number of synapses under the rule
    pub fn expected_synapse_count(&self) -> f64 {
        let candidates_per_row = if self.rule.exclude_autapses {
            self.post_size.saturating_sub(1)
        } else {
            self.post_size
        };
        self.pre_size as f64 * candidates_per_row as f64 * self.rule.probability
    }

    /// Realize the representation of the requested kind
    pub fn generate(&self, kind: ConnectivityKind) -> ConnectivityRepresentation {
        match kind {
            ConnectivityKind::Sparse => {
                ConnectivityRepresentation::Sparse(SparseConnectivity::generate(self))
            }
            ConnectivityKind::Procedural => {
                ConnectivityRepresentation::Procedural(ProceduralConnectivity::new(*self))
            }
            ConnectivityKind::Bitmask => {
                ConnectivityRepresentation::Bitmask(BitmaskConnectivity::generate(self))
            }
        }
    }
}

/// The connectivity bound to a projection
#[derive(Debug, Clone)]
pub enum ConnectivityRepresentation {
    Sparse(SparseConnectivity),
    Procedural(ProceduralConnectivity),
    Bitmask(BitmaskConnectivity),
}

impl ConnectivityRepresentation {
    pub fn kind(&self) -> ConnectivityKind {
        match self {
            ConnectivityRepresentation::Sparse(_) => ConnectivityKind::Sparse,
            ConnectivityRepresentation::Procedural(_) => ConnectivityKind::Procedural,
            ConnectivityRepresentation::Bitmask(_) => ConnectivityKind::Bitmask,
        }
    }

    pub fn pre_size(&self) -> u32 {
        match self {
            ConnectivityRepresentation::Sparse(s) => s.pre_size(),
            ConnectivityRepresentation::Procedural(p) => p.generator().pre_size(),
            ConnectivityRepresentation::Bitmask(b) => b.pre_size(),
        }
    }

    pub fn post_size(&self) -> u32 {
        match self {
            ConnectivityRepresentation::Sparse(s) => s.post_size(),
            ConnectivityRepresentation::Procedural(p) => p.generator().post_size(),
            ConnectivityRepresentation::Bitmask(b) => b.post_size(),
        }
    }

    /// Is `(pre, post)` connected
    #[inline]
    pub fn is_connected(&self, pre: u32, post: u32) -> bool {
        match self {
            ConnectivityRepresentation::Sparse(s) => s.is_connected(pre, post),
            ConnectivityRepresentation::Procedural(p) => p.is_connected(pre, post),
            ConnectivityRepresentation::Bitmask(b) => b.is_connected(pre, post),
        }
    }

    /// Targets of `pre`, ascending
    pub fn row(&self, pre: u32) -> RowTargets<'_> {
        match self {
            ConnectivityRepresentation::Sparse(s) => RowTargets::Stored(s.row(pre).iter()),
            ConnectivityRepresentation::Procedural(p) => RowTargets::Generated(p.row(pre)),
            ConnectivityRepresentation::Bitmask(b) => RowTargets::Bits(b.row(pre)),
        }
    }

    /// Total number of connected pairs
    pub fn synapse_count(&self) -> u64 {
        match self {
            ConnectivityRepresentation::Sparse(s) => s.synapse_count(),
            ConnectivityRepresentation::Procedural(p) => p.synapse_count(),
            ConnectivityRepresentation::Bitmask(b) => b.synapse_count(),
        }
    }

    /// Bytes held by the representation
    pub fn memory_bytes(&self) -> usize {
        match self {
            ConnectivityRepresentation::Sparse(s) => s.memory_bytes(),
            ConnectivityRepresentation::Procedural(_) => 0,
            ConnectivityRepresentation::Bitmask(b) => b.memory_bytes(),
        }
    }
}

/// Iterator over one row, whatever the representation
pub enum RowTargets<'a> {
    Stored(core::slice::Iter<'a, u32>),
    Generated(RowIter),
    Bits(BitRowIter<'a>),
}

impl Iterator for RowTargets<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        match self {
            RowTargets::Stored(it) => it.next().copied(),
            RowTargets::Generated(it) => it.next(),
            RowTargets::Bits(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_probability_rejected() {
        for p in [-0.1, 1.5, f64::NAN] {
            let err = ConnectivityGenerator::new(10, 10, FixedProbability::new(p), 1);
            assert!(matches!(err, Err(NeuralError::InvalidProbability(_))));
        }
    }

    #[test]
    fn test_autapse_exclusion_needs_square_shape() {
        let err = ConnectivityGenerator::new(10, 12, FixedProbability::no_autapse(0.5), 1);
        assert_eq!(
            err,
            Err(NeuralError::AutapseShapeMismatch {
                pre_size: 10,
                post_size: 12
            })
        );
    }

    #[test]
    fn test_representations_agree() {
        let gen = ConnectivityGenerator::new(200, 150, FixedProbability::new(0.2), 99).unwrap();
        let sparse = gen.generate(ConnectivityKind::Sparse);
        let procedural = gen.generate(ConnectivityKind::Procedural);
        let bitmask = gen.generate(ConnectivityKind::Bitmask);

        for i in 0..200 {
            let a: Vec<u32> = sparse.row(i).collect();
            let b: Vec<u32> = procedural.row(i).collect();
            let c: Vec<u32> = bitmask.row(i).collect();
            assert_eq!(a, b);
            assert_eq!(a, c);
            for j in 0..150 {
                let expected = a.binary_search(&j).is_ok();
                assert_eq!(sparse.is_connected(i, j), expected);
                assert_eq!(procedural.is_connected(i, j), expected);
                assert_eq!(bitmask.is_connected(i, j), expected);
            }
        }
        assert_eq!(sparse.synapse_count(), procedural.synapse_count());
        assert_eq!(sparse.synapse_count(), bitmask.synapse_count());
    }

    #[test]
    fn test_extreme_probabilities() {
        let none = ConnectivityGenerator::new(20, 20, FixedProbability::new(0.0), 3).unwrap();
        assert_eq!(none.generate(ConnectivityKind::Sparse).synapse_count(), 0);

        let all = ConnectivityGenerator::new(20, 20, FixedProbability::new(1.0), 3).unwrap();
        assert_eq!(all.generate(ConnectivityKind::Bitmask).synapse_count(), 400);

        let all_no_self =
            ConnectivityGenerator::new(20, 20, FixedProbability::no_autapse(1.0), 3).unwrap();
        let rep = all_no_self.generate(ConnectivityKind::Sparse);
        assert_eq!(rep.synapse_count(), 380);
        for i in 0..20 {
            assert!(!rep.is_connected(i, i));
        }
    }

    #[test]
    fn test_memory_footprint() {
        let gen = ConnectivityGenerator::new(100, 100, FixedProbability::new(0.1), 5).unwrap();
        assert_eq!(gen.generate(ConnectivityKind::Procedural).memory_bytes(), 0);
        // 10_000 bits = 157 words
        assert_eq!(gen.generate(ConnectivityKind::Bitmask).memory_bytes(), 157 * 8);
    }
}
