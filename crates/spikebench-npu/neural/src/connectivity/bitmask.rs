// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dense bitmask connectivity: bit `i × post_size + j` is set iff `(i, j)` is connected

use super::ConnectivityGenerator;

const WORD_BITS: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmaskConnectivity {
    pre_size: u32,
    post_size: u32,
    words: Vec<u64>,
}

impl BitmaskConnectivity {
    /// Empty mask sized `pre_size × post_size` bits
    pub fn zeroed(pre_size: u32, post_size: u32) -> Self {
        Self {
            pre_size,
            post_size,
            words: vec![0; Self::word_count(pre_size, post_size)],
        }
    }

    /// Words backing a `pre_size × post_size` mask
    pub fn word_count(pre_size: u32, post_size: u32) -> usize {
        (pre_size as u64 * post_size as u64).div_ceil(WORD_BITS) as usize
    }

    /// Take over caller-allocated storage, cleared first.
    ///
    /// `None` if `words` is not [`word_count`](Self::word_count) long.
    pub fn with_words(pre_size: u32, post_size: u32, mut words: Vec<u64>) -> Option<Self> {
        if words.len() != Self::word_count(pre_size, post_size) {
            return None;
        }
        words.fill(0);
        Some(Self {
            pre_size,
            post_size,
            words,
        })
    }

    pub fn generate(generator: &ConnectivityGenerator) -> Self {
        let mut mask = Self::zeroed(generator.pre_size(), generator.post_size());
        mask.populate(generator);
        mask
    }

    /// Set every synapse the generator produces
    pub fn populate(&mut self, generator: &ConnectivityGenerator) {
        let post_size = self.post_size;
        for i in 0..generator.pre_size().min(self.pre_size) {
            for j in generator.row(i).take_while(|&j| j < post_size) {
                self.set(i, j);
            }
        }
    }

    pub fn pre_size(&self) -> u32 {
        self.pre_size
    }

    pub fn post_size(&self) -> u32 {
        self.post_size
    }

    #[inline]
    fn bit_index(&self, pre: u32, post: u32) -> u64 {
        pre as u64 * self.post_size as u64 + post as u64
    }

    #[inline]
    pub fn set(&mut self, pre: u32, post: u32) {
        let bit = self.bit_index(pre, post);
        self.words[(bit / WORD_BITS) as usize] |= 1 << (bit % WORD_BITS);
    }

    #[inline]
    pub fn is_connected(&self, pre: u32, post: u32) -> bool {
        if pre >= self.pre_size || post >= self.post_size {
            return false;
        }
        let bit = self.bit_index(pre, post);
        self.words[(bit / WORD_BITS) as usize] & (1 << (bit % WORD_BITS)) != 0
    }

    pub fn row(&self, pre: u32) -> BitRowIter<'_> {
        let (start, end) = if pre < self.pre_size {
            let start = self.bit_index(pre, 0);
            (start, start + self.post_size as u64)
        } else {
            (0, 0)
        };
        BitRowIter {
            words: &self.words,
            row_start: start,
            cursor: start,
            end,
        }
    }

    /// Set bits of row `pre` restricted to targets in `[lo, hi)`
    pub fn row_range(&self, pre: u32, lo: u32, hi: u32) -> BitRowIter<'_> {
        let hi = hi.min(self.post_size);
        if pre >= self.pre_size || lo >= hi {
            return BitRowIter {
                words: &self.words,
                row_start: 0,
                cursor: 0,
                end: 0,
            };
        }
        let row_start = self.bit_index(pre, 0);
        BitRowIter {
            words: &self.words,
            row_start,
            cursor: row_start + lo as u64,
            end: row_start + hi as u64,
        }
    }

    pub fn synapse_count(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }

    pub fn memory_bytes(&self) -> usize {
        self.words.len() * core::mem::size_of::<u64>()
    }
}

/// Set bits of one row, ascending
pub struct BitRowIter<'a> {
    words: &'a [u64],
    row_start: u64,
    cursor: u64,
    end: u64,
}

impl Iterator for BitRowIter<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        while self.cursor < self.end {
            let word_idx = (self.cursor / WORD_BITS) as usize;
            let offset = self.cursor % WORD_BITS;
            // Bits of this word at or after the cursor
            let word = self.words[word_idx] >> offset;
            if word == 0 {
                self.cursor += WORD_BITS - offset;
                continue;
            }
            let bit = self.cursor + word.trailing_zeros() as u64;
            if bit >= self.end {
                self.cursor = self.end;
                return None;
            }
            self.cursor = bit + 1;
            return Some((bit - self.row_start) as u32);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query_across_word_boundaries() {
        let mut mask = BitmaskConnectivity::zeroed(3, 50);
        mask.set(0, 49);
        mask.set(1, 0);
        mask.set(1, 13);
        mask.set(2, 49);

        assert!(mask.is_connected(0, 49));
        assert!(mask.is_connected(1, 0));
        assert!(!mask.is_connected(0, 48));
        assert!(!mask.is_connected(3, 0));

        assert_eq!(mask.row(0).collect::<Vec<_>>(), vec![49]);
        assert_eq!(mask.row(1).collect::<Vec<_>>(), vec![0, 13]);
        assert_eq!(mask.row(2).collect::<Vec<_>>(), vec![49]);
        assert_eq!(mask.synapse_count(), 4);

        assert_eq!(mask.row_range(1, 1, 50).collect::<Vec<_>>(), vec![13]);
        assert_eq!(mask.row_range(1, 0, 13).collect::<Vec<_>>(), vec![0]);
        assert_eq!(mask.row_range(0, 10, 200).collect::<Vec<_>>(), vec![49]);
        assert_eq!(mask.row_range(0, 30, 30).count(), 0);
    }

    #[test]
    fn test_size_is_pre_times_post_bits() {
        let mask = BitmaskConnectivity::zeroed(1000, 1000);
        assert_eq!(mask.memory_bytes(), 1_000_000usize.div_ceil(64) * 8);
    }

    #[test]
    fn test_with_words_checks_length_and_clears() {
        assert!(BitmaskConnectivity::with_words(3, 50, vec![0; 2]).is_none());
        let mask = BitmaskConnectivity::with_words(3, 50, vec![u64::MAX; 3]).unwrap();
        assert_eq!(mask, BitmaskConnectivity::zeroed(3, 50));
    }
}
