// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Buffered spike recorder
//!
//! Nothing touches the filesystem while the simulation runs; the whole
//! buffer is written by one `write_cache` call afterwards.
//!
//! Output, one line per spike, time ascending:
//! ```text
//! Time [ms], Neuron ID       (optional header)
//! 12,4031
//! 12,17710
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use spikebench_model::PopulationHandle;
use spikebench_npu_runtime::{HostView, PullRequest};

use super::{Recorder, RecorderError};

pub const DEFAULT_DELIMITER: &str = ",";

#[derive(Debug, Clone)]
pub struct SpikeRecorder {
    population: PopulationHandle,
    path: Option<PathBuf>,
    delimiter: String,
    header: bool,
    /// (time, first index into `ids`) per step with at least one spike
    steps: Vec<(f64, usize)>,
    ids: Vec<u32>,
}

impl SpikeRecorder {
    pub fn new(population: PopulationHandle) -> Self {
        Self {
            population,
            path: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            header: true,
            steps: Vec::new(),
            ids: Vec::new(),
        }
    }

    /// Target file for [`write_cache`](Self::write_cache)
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of buffered spikes
    pub fn spike_count(&self) -> usize {
        self.ids.len()
    }

    /// Buffered `(time, neuron_id)` pairs in recording order
    pub fn spikes(&self) -> impl Iterator<Item = (f64, u32)> + '_ {
        self.steps.iter().enumerate().flat_map(move |(k, &(t, start))| {
            let end = self
                .steps
                .get(k + 1)
                .map(|&(_, next)| next)
                .unwrap_or(self.ids.len());
            self.ids[start..end].iter().map(move |&id| (t, id))
        })
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.ids.clear();
    }

    /// Write the buffer to any sink
    pub fn write_cache_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        if self.header {
            writeln!(out, "Time [ms]{} Neuron ID", self.delimiter)?;
        }
        for (t, id) in self.spikes() {
            writeln!(out, "{}{}{}", t, self.delimiter, id)?;
        }
        out.flush()
    }

    /// Write the buffer to the configured path in one pass
    pub fn write_cache(&self) -> Result<(), RecorderError> {
        let path = self.path.as_ref().ok_or(RecorderError::NoOutputPath("spike"))?;
        let file = File::create(path).map_err(RecorderError::io(Some(path.clone())))?;
        self.write_cache_to(BufWriter::new(file))
            .map_err(RecorderError::io(Some(path.clone())))?;
        tracing::debug!(
            target: "spikebench-npu-driver",
            "[RECORDER] Wrote {} spikes to {}",
            self.ids.len(),
            path.display()
        );
        Ok(())
    }
}

impl Recorder for SpikeRecorder {
    fn population(&self) -> PopulationHandle {
        self.population
    }

    fn requirement(&self) -> PullRequest {
        PullRequest::Spikes
    }

    fn record(&mut self, t: f64, view: &dyn HostView) -> Result<(), RecorderError> {
        let spikes = view.current_spikes(self.population);
        if !spikes.is_empty() {
            self.steps.push((t, self.ids.len()));
            self.ids.extend_from_slice(spikes);
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "spike"
    }

    fn events(&self) -> u64 {
        self.ids.len() as u64
    }
}
