// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end driver runs with recorders attached

use spikebench_model::{ModelBuilder, NetworkDefinition, NeuronInit, PopulationHandle, ProjectionSpec};
use spikebench_npu_driver::analysis::{compare_spike_trains, read_raw_f32, read_spike_csv};
use spikebench_npu_driver::{
    AnalogueRecorder, DriverError, Recorder, RecorderError, SimulationDriver, SpikeRecorder,
};
use spikebench_npu_neural::{
    ConnectivityKind, FixedProbability, GaussianNoise, LifParameters, ParallelStrategy,
};
use spikebench_npu_runtime::{CpuEngine, CpuEngineConfig, HostView, PullRequest, StateVariable};

const N_E: u32 = 400;
const N_I: u32 = 100;

fn network(kind: ConnectivityKind, strategy: ParallelStrategy) -> (NetworkDefinition, PopulationHandle) {
    let mut model = ModelBuilder::new("driver-test", 1.0, 77);
    let params = LifParameters::default();
    let init = NeuronInit::uniform_v(params.v_reset, params.v_thresh);
    let e = model.add_population("E", N_E, params, init).unwrap();
    let i = model.add_population("I", N_I, params, init).unwrap();
    model.add_current_source("E_noise", e, GaussianNoise::new(0.05, 0.3)).unwrap();

    let scale = (4000.0 / (N_E + N_I) as f32) * (0.02 / 0.1);
    for (name, src, dst, rule, w, tau) in [
        ("EE", e, e, FixedProbability::no_autapse(0.1), 4e-3 * scale, 5.0),
        ("EI", e, i, FixedProbability::new(0.1), 4e-3 * scale, 5.0),
        ("II", i, i, FixedProbability::no_autapse(0.1), -51e-3 * scale, 10.0),
        ("IE", i, e, FixedProbability::new(0.1), -51e-3 * scale, 10.0),
    ] {
        model
            .add_projection(
                ProjectionSpec::new(name, src, dst, rule)
                    .connectivity(kind)
                    .strategy(strategy)
                    .weight(w)
                    .tau_syn(tau),
            )
            .unwrap();
    }
    (model.build().unwrap(), e)
}

fn ready_driver(kind: ConnectivityKind, strategy: ParallelStrategy) -> (SimulationDriver<CpuEngine>, PopulationHandle) {
    let (net, e) = network(kind, strategy);
    let mut driver = SimulationDriver::new(CpuEngine::new(CpuEngineConfig::default()).unwrap(), net);
    driver.allocate().unwrap();
    driver.initialize().unwrap();
    (driver, e)
}

/// Sums the pulled spike list length at every step
struct SpikeCounter {
    population: PopulationHandle,
    total: u64,
    last_t: f64,
}

impl Recorder for SpikeCounter {
    fn population(&self) -> PopulationHandle {
        self.population
    }

    fn requirement(&self) -> PullRequest {
        PullRequest::Spikes
    }

    fn record(&mut self, t: f64, view: &dyn HostView) -> Result<(), RecorderError> {
        assert!(t > self.last_t);
        self.last_t = t;
        self.total += view.spike_count(self.population) as u64;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "counter"
    }

    fn events(&self) -> u64 {
        self.total
    }
}

#[test]
fn test_spike_recorder_matches_per_step_counts() {
    let (mut driver, e) = ready_driver(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic());
    let mut spikes = SpikeRecorder::new(e);
    let mut counter = SpikeCounter {
        population: e,
        total: 0,
        last_t: 0.0,
    };
    let report = driver.run(200.0, &mut [&mut spikes, &mut counter]).unwrap();

    assert_eq!(report.steps, 200);
    assert!(spikes.spike_count() > 0);
    assert_eq!(spikes.spike_count() as u64, counter.total);
    let times: Vec<f64> = spikes.spikes().map(|(t, _)| t).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert!(spikes.spikes().all(|(_, id)| id < N_E));

    assert_eq!(report.recorders.len(), 2);
    assert_eq!(report.recorders[0].kind, "spike");
    assert_eq!(report.recorders[0].population, "E");
    assert_eq!(report.recorders[0].events, counter.total);
    assert!(report.to_json_pretty().unwrap().contains("\"platform\""));
}

#[test]
fn test_span_choice_does_not_change_spike_times() {
    let record = |kind, strategy| {
        let (mut driver, e) = ready_driver(kind, strategy);
        let mut rec = SpikeRecorder::new(e);
        driver.run(150.0, &mut [&mut rec]).unwrap();
        rec.spikes().collect::<Vec<_>>()
    };
    let post = record(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic());
    let pre = record(ConnectivityKind::Procedural, ParallelStrategy::presynaptic(4));
    let bitmask = record(ConnectivityKind::Bitmask, ParallelStrategy::postsynaptic());
    assert!(compare_spike_trains(&post, &pre).is_identical());
    assert_eq!(post, bitmask);
}

#[test]
fn test_voltage_dump_size_and_spike_file() {
    let dir = tempfile::tempdir().unwrap();
    let spike_path = dir.path().join("spikes.csv");
    let voltage_path = dir.path().join("voltages.bin");

    let (mut driver, e) = ready_driver(ConnectivityKind::Sparse, ParallelStrategy::presynaptic(2));
    let mut spikes = SpikeRecorder::new(e).with_path(&spike_path);
    let mut voltages = AnalogueRecorder::to_file(e, StateVariable::V, &voltage_path).unwrap();
    let report = driver.run(50.0, &mut [&mut spikes, &mut voltages]).unwrap();
    spikes.write_cache().unwrap();
    voltages.flush().unwrap();

    let len = std::fs::metadata(&voltage_path).unwrap().len();
    assert_eq!(len, report.steps * N_E as u64 * 4);
    let values = read_raw_f32(&voltage_path).unwrap();
    assert!(values.iter().all(|v| v.is_finite()));

    let from_file = read_spike_csv(&spike_path, ",").unwrap();
    assert_eq!(from_file, spikes.spikes().collect::<Vec<_>>());
}

#[test]
fn test_sample_interval_limits_pulls() {
    let (mut driver, e) = ready_driver(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic());
    let mut v = AnalogueRecorder::buffered(e, StateVariable::RefracTime)
        .with_sample_interval(10)
        .unwrap();
    driver.run(100.0, &mut [&mut v]).unwrap();
    assert_eq!(v.samples(), 10);
    assert_eq!(v.bytes().len(), 10 * N_E as usize * 4);
}

#[test]
fn test_recorder_for_foreign_population_is_rejected() {
    let (mut driver, _) = ready_driver(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic());

    let mut other = ModelBuilder::new("other", 1.0, 1);
    let params = LifParameters::default();
    for name in ["A", "B", "C"] {
        other.add_population(name, 1, params, NeuronInit::resting_at(-60.0)).unwrap();
    }
    let foreign = other.build().unwrap().population_by_name("C").unwrap();

    let mut rec = SpikeRecorder::new(foreign);
    assert!(matches!(
        driver.run(10.0, &mut [&mut rec]),
        Err(DriverError::UnknownPopulation { kind: "spike", handle: 2 })
    ));
}

#[test]
fn test_finished_run_must_be_reinitialized() {
    let (mut driver, e) = ready_driver(ConnectivityKind::Sparse, ParallelStrategy::postsynaptic());
    let mut rec = SpikeRecorder::new(e);
    let first = driver.run(30.0, &mut [&mut rec]).unwrap();
    assert_eq!(first.steps, 30);
    assert!(driver.run(60.0, &mut [&mut rec]).is_err());

    driver.initialize().unwrap();
    let again = driver.run(30.0, &mut []).unwrap();
    assert_eq!(again.steps, 30);
}

/// Collects the time of every recording call
struct StepTimes {
    population: PopulationHandle,
    times: Vec<f64>,
}

impl Recorder for StepTimes {
    fn population(&self) -> PopulationHandle {
        self.population
    }

    fn requirement(&self) -> PullRequest {
        PullRequest::Spikes
    }

    fn record(&mut self, t: f64, _view: &dyn HostView) -> Result<(), RecorderError> {
        self.times.push(t);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "times"
    }

    fn events(&self) -> u64 {
        self.times.len() as u64
    }
}

#[test]
fn test_sub_millisecond_timestep_records_decimal_times() {
    let mut model = ModelBuilder::new("fine-dt", 0.1, 3);
    let params = LifParameters::default();
    let pop = model
        .add_population("P", 20, params, NeuronInit::resting_at(params.v_rest))
        .unwrap();
    let mut driver = SimulationDriver::new(
        CpuEngine::new(CpuEngineConfig::default()).unwrap(),
        model.build().unwrap(),
    );
    driver.allocate().unwrap();
    driver.initialize().unwrap();

    let mut rec = StepTimes {
        population: pop,
        times: Vec::new(),
    };
    let report = driver.run(2.0, &mut [&mut rec]).unwrap();

    assert_eq!(report.steps, 20);
    let printed: Vec<String> = rec.times.iter().map(f64::to_string).collect();
    assert_eq!(printed[..3], ["0.1", "0.2", "0.3"]);
    assert_eq!(printed.last().map(String::as_str), Some("2"));
    assert!(printed.iter().all(|t| t.len() <= 3), "{:?}", printed);
}
