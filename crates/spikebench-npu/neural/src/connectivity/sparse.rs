// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compressed sparse row (CSR) connectivity

use super::ConnectivityGenerator;

/// Explicit target lists, one contiguous ascending slice per presynaptic row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseConnectivity {
    pre_size: u32,
    post_size: u32,
    /// `row_offsets[i]..row_offsets[i + 1]` indexes `targets` for row `i`
    row_offsets: Vec<usize>,
    targets: Vec<u32>,
}

impl SparseConnectivity {
    /// Materialize every row sequentially
    pub fn generate(generator: &ConnectivityGenerator) -> Self {
        let rows = (0..generator.pre_size()).map(|i| generator.row(i).collect::<Vec<u32>>());
        Self::from_rows(generator.pre_size(), generator.post_size(), rows)
    }

    /// Assemble from already generated rows (e.g. produced in parallel).
    ///
    /// Rows must be ascending and `pre_size` rows long.
    pub fn from_rows<I>(pre_size: u32, post_size: u32, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<u32>>,
    {
        let mut row_offsets = Vec::with_capacity(pre_size as usize + 1);
        let mut targets = Vec::new();
        row_offsets.push(0);
        for row in rows {
            debug_assert!(row.windows(2).all(|w| w[0] < w[1]));
            targets.extend_from_slice(&row);
            row_offsets.push(targets.len());
        }
        debug_assert_eq!(row_offsets.len(), pre_size as usize + 1);
        targets.shrink_to_fit();
        Self {
            pre_size,
            post_size,
            row_offsets,
            targets,
        }
    }

    /// Assemble from prebuilt CSR buffers.
    ///
    /// `None` unless `row_offsets` holds `pre_size + 1` non-decreasing
    /// offsets starting at 0 and ending at `targets.len()`.
    pub fn from_csr(
        pre_size: u32,
        post_size: u32,
        row_offsets: Vec<usize>,
        targets: Vec<u32>,
    ) -> Option<Self> {
        let well_formed = row_offsets.len() == pre_size as usize + 1
            && row_offsets.first() == Some(&0)
            && row_offsets.last() == Some(&targets.len())
            && row_offsets.windows(2).all(|w| w[0] <= w[1]);
        well_formed.then_some(Self {
            pre_size,
            post_size,
            row_offsets,
            targets,
        })
    }

    pub fn pre_size(&self) -> u32 {
        self.pre_size
    }

    pub fn post_size(&self) -> u32 {
        self.post_size
    }

    #[inline]
    pub fn row(&self, pre: u32) -> &[u32] {
        let i = pre as usize;
        match (self.row_offsets.get(i), self.row_offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.targets[start..end],
            _ => &[],
        }
    }

    #[inline]
    pub fn is_connected(&self, pre: u32, post: u32) -> bool {
        self.row(pre).binary_search(&post).is_ok()
    }

    pub fn synapse_count(&self) -> u64 {
        self.targets.len() as u64
    }

    pub fn memory_bytes(&self) -> usize {
        self.row_offsets.len() * core::mem::size_of::<usize>()
            + self.targets.len() * core::mem::size_of::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_layout() {
        let sparse = SparseConnectivity::from_rows(3, 4, vec![vec![0, 2], vec![], vec![1, 2, 3]]);
        assert_eq!(sparse.row(0), &[0, 2]);
        assert!(sparse.row(1).is_empty());
        assert_eq!(sparse.row(2), &[1, 2, 3]);
        assert!(sparse.row(3).is_empty());
        assert_eq!(sparse.synapse_count(), 5);
        assert!(sparse.is_connected(2, 3));
        assert!(!sparse.is_connected(0, 1));
    }

    #[test]
    fn test_from_csr_matches_from_rows() {
        let rows = SparseConnectivity::from_rows(3, 4, vec![vec![0, 2], vec![], vec![1, 2, 3]]);
        let csr = SparseConnectivity::from_csr(3, 4, vec![0, 2, 2, 5], vec![0, 2, 1, 2, 3]).unwrap();
        assert_eq!(rows, csr);
    }

    #[test]
    fn test_from_csr_rejects_malformed_offsets() {
        assert!(SparseConnectivity::from_csr(2, 4, vec![0, 1], vec![0]).is_none());
        assert!(SparseConnectivity::from_csr(2, 4, vec![0, 2, 1], vec![0, 1]).is_none());
        assert!(SparseConnectivity::from_csr(2, 4, vec![0, 1, 3], vec![0, 1]).is_none());
    }
}
