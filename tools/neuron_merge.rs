// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron update throughput benchmark.
//!
//! Splits `neuron_merge.total_neurons` into equal, unconnected populations,
//! each driven by Gaussian noise, and reports how long neuron updates take.
//! Nothing is recorded.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use spikebench::cli::{split_debug_flags, CommonArgs};
use spikebench::config::SpikebenchConfig;
use spikebench::driver::SimulationDriver;
use spikebench::networks::{build_neuron_merge, engine_config};
use spikebench::observability::debug_flags_help;
use spikebench::runtime::CpuEngine;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "neuron_merge", about = "Neuron update throughput over many noise-driven populations")]
#[command(after_help = debug_flags_help())]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let (args, debug_flags) = split_debug_flags(std::env::args());
    let cli = Cli::parse_from(args);

    let result = cli.common.load_config().and_then(|config| {
        let _guard = cli.common.init_logging(&debug_flags, &config)?;
        run(&cli, &config).map_err(|e| {
            tracing::error!(target: "spikebench", "{:#}", e);
            e
        })
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("neuron_merge: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &SpikebenchConfig) -> Result<()> {
    let merge = build_neuron_merge(config)?;
    let engine = CpuEngine::new(engine_config(&config.simulation))?;
    let mut driver = SimulationDriver::new(engine, merge.network);
    driver.allocate()?;
    driver.initialize()?;

    let report = driver.run(config.simulation.duration, &mut [])?;

    let neurons = report.network.total_neurons;
    let update_s = report.timings.neuron_update_s;
    let per_step_us = if report.steps > 0 {
        update_s * 1e6 / report.steps as f64
    } else {
        0.0
    };
    info!(
        target: "spikebench",
        "[MERGE] {} populations, {} neurons: neuron update {:.3}s ({:.1} us/step)",
        merge.populations.len(),
        neurons,
        update_s,
        per_step_us
    );

    report.log();
    cli.common.write_report(&report)?;
    Ok(())
}
