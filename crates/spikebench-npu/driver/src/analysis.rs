// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Post-run analysis of recorder output
//!
//! - Spike files are compared per timestep as multisets of neuron ids, so
//!   two engines that order spikes differently within a step still match.
//! - Voltage dumps are compared by RMSE computed in f64.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Raw dump {path} is {len} bytes, not a whole number of f32 values")]
    TrailingBytes { path: PathBuf, len: usize },

    #[error("Length mismatch: {left} vs {right} values")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid histogram parameters: {0}")]
    InvalidHistogram(&'static str),
}

fn read(path: &Path) -> Result<Vec<u8>, AnalysisError> {
    fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `(time, neuron_id)` pairs; a leading non-numeric line is a header
pub fn read_spike_csv(path: &Path, delimiter: &str) -> Result<Vec<(f64, u32)>, AnalysisError> {
    let bytes = read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let mut spikes = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parse_err = |reason: String| AnalysisError::Parse {
            path: path.to_path_buf(),
            line: n + 1,
            reason,
        };
        let (time, id) = line
            .split_once(delimiter)
            .ok_or_else(|| parse_err(format!("missing delimiter '{}'", delimiter)))?;
        let time = match time.trim().parse::<f64>() {
            Ok(t) => t,
            Err(_) if n == 0 => continue,
            Err(e) => return Err(parse_err(format!("bad time '{}': {}", time, e))),
        };
        let id = id
            .trim()
            .parse::<u32>()
            .map_err(|e| parse_err(format!("bad neuron id '{}': {}", id, e)))?;
        spikes.push((time, id));
    }
    Ok(spikes)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpikeComparison {
    pub left_spikes: usize,
    pub right_spikes: usize,
    pub matched: usize,
    /// Timesteps whose id multisets differ
    pub mismatched_steps: Vec<f64>,
}

impl SpikeComparison {
    pub fn is_identical(&self) -> bool {
        self.mismatched_steps.is_empty() && self.left_spikes == self.right_spikes
    }
}

/// Time keys compared bit-exactly; both files come from the same clock
fn group_by_step(spikes: &[(f64, u32)]) -> BTreeMap<u64, Vec<u32>> {
    let mut steps: BTreeMap<u64, Vec<u32>> = BTreeMap::new();
    for &(t, id) in spikes {
        steps.entry(order_key(t)).or_default().push(id);
    }
    for ids in steps.values_mut() {
        ids.sort_unstable();
    }
    steps
}

/// Monotone map from f64 to u64 so the BTreeMap iterates in time order
fn order_key(t: f64) -> u64 {
    let bits = t.to_bits();
    if bits >> 63 == 0 {
        bits | (1 << 63)
    } else {
        !bits
    }
}

fn from_order_key(key: u64) -> f64 {
    if key >> 63 == 1 {
        f64::from_bits(key & !(1 << 63))
    } else {
        f64::from_bits(!key)
    }
}

/// Every spike must be matched exactly once at the same timestep
pub fn compare_spike_trains(left: &[(f64, u32)], right: &[(f64, u32)]) -> SpikeComparison {
    let a = group_by_step(left);
    let b = group_by_step(right);
    let mut comparison = SpikeComparison {
        left_spikes: left.len(),
        right_spikes: right.len(),
        ..Default::default()
    };

    let mut keys: Vec<u64> = a.keys().chain(b.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();
    for key in keys {
        let empty = Vec::new();
        let x = a.get(&key).unwrap_or(&empty);
        let y = b.get(&key).unwrap_or(&empty);
        // Multiset intersection of two sorted lists
        let (mut i, mut j) = (0, 0);
        while i < x.len() && j < y.len() {
            match x[i].cmp(&y[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    comparison.matched += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        if x != y {
            comparison.mismatched_steps.push(from_order_key(key));
        }
    }
    comparison
}

/// Read a headerless little-endian f32 dump
pub fn read_raw_f32(path: &Path) -> Result<Vec<f32>, AnalysisError> {
    let bytes = read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(AnalysisError::TrailingBytes {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Root mean square error, accumulated in f64
pub fn voltage_rmse(left: &[f32], right: &[f32]) -> Result<f64, AnalysisError> {
    if left.len() != right.len() {
        return Err(AnalysisError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = left
        .iter()
        .zip(right)
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum();
    Ok((sum / left.len() as f64).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateBin {
    pub start_ms: f64,
    /// Mean firing rate per neuron over the bin
    pub rate_hz: f64,
}

/// Bin spikes into `(k·bin_ms, (k+1)·bin_ms]` over `[0, duration_ms]`
///
/// Spikes carry the time at the end of the step that produced them, so a
/// run of `duration_ms` stamps its last step's spikes at `duration_ms`.
/// Those land in the last bin; a spike at exactly 0 lands in the first.
pub fn firing_rate_histogram(
    spikes: &[(f64, u32)],
    population_size: u32,
    bin_ms: f64,
    duration_ms: f64,
) -> Result<Vec<RateBin>, AnalysisError> {
    if !(bin_ms > 0.0 && bin_ms.is_finite()) {
        return Err(AnalysisError::InvalidHistogram("bin width must be positive"));
    }
    if !(duration_ms >= 0.0 && duration_ms.is_finite()) {
        return Err(AnalysisError::InvalidHistogram("duration must be non-negative"));
    }
    if population_size == 0 {
        return Err(AnalysisError::InvalidHistogram("population is empty"));
    }

    let num_bins = (duration_ms / bin_ms).ceil() as usize;
    let mut counts = vec![0u64; num_bins];
    for &(t, _) in spikes {
        if t < 0.0 || t > duration_ms || num_bins == 0 {
            continue;
        }
        let bin = ((t / bin_ms).ceil() as usize)
            .saturating_sub(1)
            .min(num_bins - 1);
        counts[bin] += 1;
    }

    let bin_s = bin_ms / 1000.0;
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(k, c)| RateBin {
            start_ms: k as f64 * bin_ms,
            rate_hz: c as f64 / population_size as f64 / bin_s,
        })
        .collect())
}
