// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Procedural connectivity: rows are regenerated every time they are needed

use super::{ConnectivityGenerator, RowIter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProceduralConnectivity {
    generator: ConnectivityGenerator,
}

impl ProceduralConnectivity {
    pub fn new(generator: ConnectivityGenerator) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &ConnectivityGenerator {
        &self.generator
    }

    #[inline]
    pub fn row(&self, pre: u32) -> RowIter {
        self.generator.row(pre)
    }

    /// Regenerates row `pre` up to `post`
    pub fn is_connected(&self, pre: u32, post: u32) -> bool {
        if pre >= self.generator.pre_size() {
            return false;
        }
        self.row(pre)
            .take_while(|&j| j <= post)
            .any(|j| j == post)
    }

    /// Regenerates every row
    pub fn synapse_count(&self) -> u64 {
        (0..self.generator.pre_size())
            .map(|i| self.row(i).count() as u64)
            .sum()
    }
}
