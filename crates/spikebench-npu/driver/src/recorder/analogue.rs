// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Analogue (state variable) recorder
//!
//! Samples one [`StateVariable`] of a population every `sample_interval`
//! steps. Output goes to any `Write` sink:
//! - `Vec<u8>` via [`AnalogueRecorder::buffered`] (in memory)
//! - `BufWriter<File>` via [`AnalogueRecorder::to_file`] (streamed)
//!
//! ## Formats
//! - `Text`: one row per sample, `t<d>v0<d>v1...`
//! - `Raw`: little-endian f32 values back to back, no header, no time column.
//!   A full-population dump of `steps` samples is `steps × n × 4` bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use spikebench_model::PopulationHandle;
use spikebench_npu_neural::Scalar;
use spikebench_npu_runtime::{HostView, PullRequest, StateVariable};

use super::{Recorder, RecorderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalogueFormat {
    Text { delimiter: String },
    Raw,
}

impl AnalogueFormat {
    pub fn text() -> Self {
        AnalogueFormat::Text {
            delimiter: ",".to_string(),
        }
    }
}

/// Which neurons of the population are sampled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeuronSelection {
    All,
    Indices(Vec<u32>),
}

pub struct AnalogueRecorder<W: Write = Vec<u8>> {
    population: PopulationHandle,
    variable: StateVariable,
    selection: NeuronSelection,
    format: AnalogueFormat,
    sample_interval: u64,
    sink: W,
    path: Option<PathBuf>,
    samples: u64,
    values_written: u64,
}

impl AnalogueRecorder<Vec<u8>> {
    /// Recorder that appends to an in-memory buffer
    pub fn buffered(population: PopulationHandle, variable: StateVariable) -> Self {
        Self::with_sink(population, variable, Vec::new())
    }

    /// Bytes recorded so far
    pub fn bytes(&self) -> &[u8] {
        &self.sink
    }
}

impl AnalogueRecorder<BufWriter<File>> {
    /// Recorder that streams to a newly created file
    pub fn to_file(
        population: PopulationHandle,
        variable: StateVariable,
        path: impl AsRef<Path>,
    ) -> Result<Self, RecorderError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(RecorderError::io(Some(path.clone())))?;
        let mut recorder = Self::with_sink(population, variable, BufWriter::new(file));
        recorder.path = Some(path);
        Ok(recorder)
    }
}

impl<W: Write> AnalogueRecorder<W> {
    pub fn with_sink(population: PopulationHandle, variable: StateVariable, sink: W) -> Self {
        Self {
            population,
            variable,
            selection: NeuronSelection::All,
            format: AnalogueFormat::Raw,
            sample_interval: 1,
            sink,
            path: None,
            samples: 0,
            values_written: 0,
        }
    }

    pub fn with_format(mut self, format: AnalogueFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_selection(mut self, selection: NeuronSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Sample every `interval` steps (1 = every step)
    pub fn with_sample_interval(mut self, interval: u64) -> Result<Self, RecorderError> {
        if interval == 0 {
            return Err(RecorderError::InvalidSampleInterval);
        }
        self.sample_interval = interval;
        Ok(self)
    }

    pub fn variable(&self) -> StateVariable {
        self.variable
    }

    /// Samples taken so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn flush(&mut self) -> Result<(), RecorderError> {
        let path = self.path.clone();
        self.sink.flush().map_err(RecorderError::io(path))
    }

    /// Flush and hand back the sink
    pub fn into_inner(mut self) -> Result<W, RecorderError> {
        self.flush()?;
        Ok(self.sink)
    }

    fn write_sample(&mut self, t: f64, values: &[Scalar]) -> std::io::Result<u64> {
        let selected: Box<dyn Iterator<Item = Scalar> + '_> = match &self.selection {
            NeuronSelection::All => Box::new(values.iter().copied()),
            NeuronSelection::Indices(ids) => Box::new(ids.iter().map(|&i| values[i as usize])),
        };
        let mut written = 0;
        match &self.format {
            AnalogueFormat::Raw => {
                for v in selected {
                    self.sink.write_all(&v.to_le_bytes())?;
                    written += 1;
                }
            }
            AnalogueFormat::Text { delimiter } => {
                write!(self.sink, "{}", t)?;
                for v in selected {
                    write!(self.sink, "{}{}", delimiter, v)?;
                    written += 1;
                }
                writeln!(self.sink)?;
            }
        }
        Ok(written)
    }
}

impl<W: Write> Recorder for AnalogueRecorder<W> {
    fn population(&self) -> PopulationHandle {
        self.population
    }

    fn requirement(&self) -> PullRequest {
        PullRequest::State(self.variable)
    }

    fn is_due(&self, step: u64) -> bool {
        step % self.sample_interval == 0
    }

    fn record(&mut self, t: f64, view: &dyn HostView) -> Result<(), RecorderError> {
        let values = view.state(self.population, self.variable);
        if let NeuronSelection::Indices(ids) = &self.selection {
            if let Some(&index) = ids.iter().find(|&&i| i as usize >= values.len()) {
                return Err(RecorderError::IndexOutOfRange {
                    index,
                    size: values.len(),
                });
            }
        }
        let written = self
            .write_sample(t, values)
            .map_err(RecorderError::io(self.path.clone()))?;
        self.samples += 1;
        self.values_written += written;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "analogue"
    }

    fn events(&self) -> u64 {
        self.values_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedView {
        v: Vec<Scalar>,
    }

    impl HostView for FixedView {
        fn current_spikes(&self, _pop: PopulationHandle) -> &[u32] {
            &[]
        }

        fn state(&self, _pop: PopulationHandle, _var: StateVariable) -> &[Scalar] {
            &self.v
        }
    }

    fn first_population() -> PopulationHandle {
        let mut builder = spikebench_model::PopulationBuilder::new(0);
        builder
            .add_population(
                "P",
                3,
                spikebench_npu_neural::LifParameters::default(),
                spikebench_model::NeuronInit::resting_at(-60.0),
            )
            .unwrap()
    }

    #[test]
    fn test_raw_format_is_little_endian_f32() {
        let pop = first_population();
        let view = FixedView {
            v: vec![-60.0, -55.5, 1.25],
        };
        let mut rec = AnalogueRecorder::buffered(pop, StateVariable::V);
        rec.record(1.0, &view).unwrap();
        rec.record(2.0, &view).unwrap();
        assert_eq!(rec.bytes().len(), 2 * 3 * 4);
        assert_eq!(&rec.bytes()[4..8], &(-55.5f32).to_le_bytes());
        assert_eq!(rec.events(), 6);
    }

    #[test]
    fn test_text_format_with_selection() {
        let pop = first_population();
        let view = FixedView {
            v: vec![-60.0, -55.5, 1.25],
        };
        let mut rec = AnalogueRecorder::buffered(pop, StateVariable::V)
            .with_format(AnalogueFormat::Text {
                delimiter: ";".into(),
            })
            .with_selection(NeuronSelection::Indices(vec![2, 0]));
        rec.record(3.0, &view).unwrap();
        let text = String::from_utf8(rec.into_inner().unwrap()).unwrap();
        assert_eq!(text, "3;1.25;-60\n");
    }

    #[test]
    fn test_selection_out_of_range() {
        let pop = first_population();
        let view = FixedView { v: vec![0.0; 3] };
        let mut rec = AnalogueRecorder::buffered(pop, StateVariable::V)
            .with_selection(NeuronSelection::Indices(vec![3]));
        assert!(matches!(
            rec.record(1.0, &view),
            Err(RecorderError::IndexOutOfRange { index: 3, size: 3 })
        ));
        assert_eq!(rec.samples(), 0);
    }

    #[test]
    fn test_sample_interval() {
        let pop = first_population();
        let rec = AnalogueRecorder::buffered(pop, StateVariable::RefracTime)
            .with_sample_interval(5)
            .unwrap();
        let due: Vec<u64> = (1..=20).filter(|&s| rec.is_due(s)).collect();
        assert_eq!(due, vec![5, 10, 15, 20]);
        assert_eq!(rec.requirement(), PullRequest::State(StateVariable::RefracTime));
        assert!(AnalogueRecorder::buffered(pop, StateVariable::V)
            .with_sample_interval(0)
            .is_err());
    }
}
