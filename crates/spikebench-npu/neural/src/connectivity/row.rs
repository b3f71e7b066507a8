// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Geometric-skip row generator

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy)]
enum RowMode {
    Empty,
    Dense,
    /// ln(1 − p), strictly negative
    Geometric(f64),
}

/// Ascending targets of one presynaptic row
#[derive(Debug, Clone)]
pub struct RowIter {
    rng: ChaCha8Rng,
    mode: RowMode,
    next: u64,
    post_size: u64,
    skip: Option<u32>,
}

impl RowIter {
    pub(crate) fn new(row_seed: u64, probability: f64, post_size: u32, skip: Option<u32>) -> Self {
        let mode = if probability <= 0.0 || post_size == 0 {
            RowMode::Empty
        } else if probability >= 1.0 {
            RowMode::Dense
        } else {
            RowMode::Geometric((-probability).ln_1p())
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(row_seed),
            mode,
            next: 0,
            post_size: post_size as u64,
            skip,
        }
    }

    #[inline]
    fn advance(&mut self) -> Option<u64> {
        if self.next >= self.post_size {
            return None;
        }
        match self.mode {
            RowMode::Empty => None,
            RowMode::Dense => {
                let j = self.next;
                self.next += 1;
                Some(j)
            }
            RowMode::Geometric(ln_q) => {
                // u in (0, 1] so ln(u) is finite
                let u = 1.0 - self.rng.gen::<f64>();
                let skip = (u.ln() / ln_q).floor();
                let remaining = (self.post_size - self.next) as f64;
                if skip >= remaining {
                    self.next = self.post_size;
                    return None;
                }
                let j = self.next + skip as u64;
                self.next = j + 1;
                Some(j)
            }
        }
    }
}

impl Iterator for RowIter {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        loop {
            let j = self.advance()? as u32;
            if Some(j) != self.skip {
                return Some(j);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_is_strictly_ascending_and_bounded() {
        let row: Vec<u32> = RowIter::new(11, 0.3, 1000, None).collect();
        assert!(!row.is_empty());
        assert!(row.windows(2).all(|w| w[0] < w[1]));
        assert!(row.iter().all(|&j| j < 1000));
    }

    #[test]
    fn test_same_seed_same_row() {
        let a: Vec<u32> = RowIter::new(5, 0.05, 10_000, None).collect();
        let b: Vec<u32> = RowIter::new(5, 0.05, 10_000, None).collect();
        let c: Vec<u32> = RowIter::new(6, 0.05, 10_000, None).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_skip_removes_only_that_index() {
        let with: Vec<u32> = RowIter::new(8, 1.0, 50, None).collect();
        let without: Vec<u32> = RowIter::new(8, 1.0, 50, Some(7)).collect();
        assert_eq!(with.len(), 50);
        assert_eq!(without.len(), 49);
        assert!(!without.contains(&7));
    }
}
