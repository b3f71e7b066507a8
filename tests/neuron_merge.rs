// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use spikebench::config::SpikebenchConfig;
use spikebench::networks::{build_neuron_merge, engine_config};
use spikebench::prelude::*;

#[test]
fn test_noise_driven_populations_run_without_recorders() {
    let mut config = SpikebenchConfig::default();
    config.neuron_merge.total_neurons = 2000;
    config.neuron_merge.num_populations = 5;
    config.simulation.duration = 50.0;

    let merge = build_neuron_merge(&config).unwrap();
    assert_eq!(merge.populations.len(), 5);

    let engine = CpuEngine::new(engine_config(&config.simulation)).unwrap();
    let mut driver = SimulationDriver::new(engine, merge.network);
    driver.allocate().unwrap();
    driver.initialize().unwrap();
    let report = driver.run(config.simulation.duration, &mut []).unwrap();

    assert_eq!(report.steps, 50);
    assert_eq!(report.network.total_neurons, 2000);
    assert!(report.network.projections.is_empty());
    assert!(report.recorders.is_empty());
    assert!(report.timings.neuron_update_s > 0.0);
}

#[test]
fn test_noise_moves_membrane_potential() {
    let mut config = SpikebenchConfig::default();
    config.neuron_merge.total_neurons = 100;
    config.neuron_merge.num_populations = 1;
    config.simulation.duration = 20.0;

    let merge = build_neuron_merge(&config).unwrap();
    let pop = merge.populations[0];
    let engine = CpuEngine::new(engine_config(&config.simulation)).unwrap();
    let mut driver = SimulationDriver::new(engine, merge.network);
    driver.allocate().unwrap();
    driver.initialize().unwrap();

    let mut v = AnalogueRecorder::buffered(pop, StateVariable::V);
    driver.run(config.simulation.duration, &mut [&mut v]).unwrap();
    let last: Vec<f32> = v.bytes()[v.bytes().len() - 400..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert!(last.iter().any(|&x| x != -70.0));
}
