// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Excitatory/inhibitory LIF benchmark.
//!
//! Builds the E/I network from `spikebench.toml` (plus env and `--set`
//! overrides), runs it for `simulation.duration` ms and writes the
//! excitatory spike trains, optionally the excitatory voltages, and a
//! timing report.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use spikebench::cli::{split_debug_flags, CommonArgs};
use spikebench::driver::analysis::firing_rate_histogram;
use spikebench::driver::{AnalogueRecorder, Recorder, SimulationDriver, SpikeRecorder};
use spikebench::networks::{build_va_benchmark, engine_config};
use spikebench::observability::debug_flags_help;
use spikebench::runtime::{CpuEngine, StateVariable};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "va_benchmark", about = "Excitatory/inhibitory LIF network benchmark")]
#[command(after_help = debug_flags_help())]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Log the excitatory firing rate in bins of this width (ms)
    #[arg(long, value_name = "MS")]
    rate_bin: Option<f64>,
}

fn main() -> ExitCode {
    let (args, debug_flags) = split_debug_flags(std::env::args());
    let cli = Cli::parse_from(args);

    let config = match cli.common.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("va_benchmark: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = match cli.common.init_logging(&debug_flags, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("va_benchmark: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "spikebench", "{:#}", e);
            eprintln!("va_benchmark: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &spikebench::config::SpikebenchConfig) -> Result<()> {
    let recording = &config.recording;
    let bench = build_va_benchmark(config)?;
    let num_excitatory = config.network.num_excitatory();

    let engine = CpuEngine::new(engine_config(&config.simulation))?;
    let mut driver = SimulationDriver::new(engine, bench.network);
    driver.allocate()?;
    driver.initialize()?;

    if recording.record_spikes || recording.record_voltages {
        std::fs::create_dir_all(&recording.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                recording.output_dir.display()
            )
        })?;
    }

    let mut spikes = SpikeRecorder::new(bench.excitatory)
        .with_path(recording.spike_path())
        .with_delimiter(recording.delimiter.clone())
        .with_header(recording.header);
    let mut voltages = if recording.record_voltages {
        Some(
            AnalogueRecorder::to_file(bench.excitatory, StateVariable::V, recording.voltage_path())?
                .with_sample_interval(recording.voltage_sample_interval)?,
        )
    } else {
        None
    };

    let report = {
        let mut recorders: Vec<&mut dyn Recorder> = Vec::new();
        if recording.record_spikes {
            recorders.push(&mut spikes);
        }
        if let Some(v) = voltages.as_mut() {
            recorders.push(v);
        }
        driver.run(config.simulation.duration, &mut recorders)?
    };

    if recording.record_spikes {
        spikes.write_cache()?;
        info!(
            target: "spikebench",
            "Wrote {} excitatory spikes to {}",
            spikes.spike_count(),
            recording.spike_path().display()
        );
    }
    if let Some(v) = voltages {
        let samples = v.samples();
        v.into_inner()?;
        info!(
            target: "spikebench",
            "Wrote {} voltage samples to {}",
            samples,
            recording.voltage_path().display()
        );
    }

    if let (Some(bin_ms), true) = (cli.rate_bin, recording.record_spikes) {
        let spikes: Vec<(f64, u32)> = spikes.spikes().collect();
        let bins = firing_rate_histogram(
            &spikes,
            num_excitatory,
            bin_ms,
            config.simulation.duration,
        )?;
        for bin in bins {
            info!(
                target: "spikebench",
                "[RATE] {:>8.1} ms  {:>8.2} Hz",
                bin.start_ms,
                bin.rate_hz
            );
        }
    }

    report.log();
    cli.common.write_report(&report)?;
    Ok(())
}
