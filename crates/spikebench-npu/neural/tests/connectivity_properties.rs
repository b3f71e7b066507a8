// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Statistical and structural properties of fixed-probability connectivity
//!
//! - synapse counts stay close to `Npre × Npost × p`
//! - autapse exclusion never produces `(i, i)`
//! - sparse, procedural and bitmask realizations of one generator are identical

use proptest::prelude::*;
use spikebench_npu_neural::{ConnectivityGenerator, ConnectivityKind, FixedProbability};

/// Count should lie within `k` standard deviations of the binomial mean
fn assert_binomial(count: u64, trials: f64, p: f64, k: f64) {
    let mean = trials * p;
    let sd = (trials * p * (1.0 - p)).sqrt();
    let diff = (count as f64 - mean).abs();
    assert!(
        diff <= k * sd + 1.0,
        "count {} deviates from mean {:.1} by more than {}σ (σ = {:.1})",
        count,
        mean,
        k,
        sd
    );
}

#[test]
fn test_large_projection_count_matches_probability() {
    let gen = ConnectivityGenerator::new(2000, 3000, FixedProbability::new(0.1), 1234).unwrap();
    let count = gen.generate(ConnectivityKind::Sparse).synapse_count();
    assert_binomial(count, 2000.0 * 3000.0, 0.1, 6.0);
    assert!((gen.expected_synapse_count() - 600_000.0).abs() < 1e-6);
}

#[test]
fn test_autapse_free_count_uses_n_minus_one() {
    let gen = ConnectivityGenerator::new(1500, 1500, FixedProbability::no_autapse(0.2), 77).unwrap();
    let rep = gen.generate(ConnectivityKind::Sparse);
    assert_binomial(rep.synapse_count(), 1500.0 * 1499.0, 0.2, 6.0);
    for i in 0..1500 {
        assert!(rep.row(i).all(|j| j != i));
    }
}

#[test]
fn test_row_lengths_are_balanced() {
    // Each row is Binomial(Npost, p); no row should be wildly off
    let gen = ConnectivityGenerator::new(500, 4000, FixedProbability::new(0.05), 9).unwrap();
    for i in 0..500 {
        assert_binomial(gen.row(i).count() as u64, 4000.0, 0.05, 6.0);
    }
}

#[test]
fn test_different_seeds_give_different_connectivity() {
    let a = ConnectivityGenerator::new(100, 100, FixedProbability::new(0.1), 1).unwrap();
    let b = ConnectivityGenerator::new(100, 100, FixedProbability::new(0.1), 2).unwrap();
    let rows_a: Vec<Vec<u32>> = (0..100).map(|i| a.row(i).collect()).collect();
    let rows_b: Vec<Vec<u32>> = (0..100).map(|i| b.row(i).collect()).collect();
    assert_ne!(rows_a, rows_b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_representations_are_equivalent(
        pre in 1u32..120,
        post in 1u32..120,
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let gen = ConnectivityGenerator::new(pre, post, FixedProbability::new(p), seed).unwrap();
        let sparse = gen.generate(ConnectivityKind::Sparse);
        let procedural = gen.generate(ConnectivityKind::Procedural);
        let bitmask = gen.generate(ConnectivityKind::Bitmask);

        for i in 0..pre {
            let row: Vec<u32> = sparse.row(i).collect();
            prop_assert!(row.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(row.iter().all(|&j| j < post));
            prop_assert_eq!(&row, &procedural.row(i).collect::<Vec<_>>());
            prop_assert_eq!(&row, &bitmask.row(i).collect::<Vec<_>>());
        }
        prop_assert_eq!(sparse.synapse_count(), bitmask.synapse_count());
        prop_assert_eq!(sparse.synapse_count(), procedural.synapse_count());
    }

    #[test]
    fn test_no_autapse_never_self_connects(
        n in 1u32..150,
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let gen = ConnectivityGenerator::new(n, n, FixedProbability::no_autapse(p), seed).unwrap();
        for kind in [ConnectivityKind::Sparse, ConnectivityKind::Procedural, ConnectivityKind::Bitmask] {
            let rep = gen.generate(kind);
            for i in 0..n {
                prop_assert!(!rep.is_connected(i, i));
            }
        }
    }

    #[test]
    fn test_generation_is_reproducible(
        pre in 1u32..80,
        post in 1u32..80,
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let a = ConnectivityGenerator::new(pre, post, FixedProbability::new(p), seed).unwrap();
        let b = ConnectivityGenerator::new(pre, post, FixedProbability::new(p), seed).unwrap();
        for i in 0..pre {
            prop_assert_eq!(a.row(i).collect::<Vec<_>>(), b.row(i).collect::<Vec<_>>());
        }
    }
}
