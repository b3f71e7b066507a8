// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compare the outputs of two benchmark runs.
//!
//! Spike files must match exactly per timestep (order within a step is
//! ignored). Voltage dumps, if given, must agree within `--max-rmse`.
//! Exits 1 on any mismatch, 2 on unreadable input.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use spikebench::driver::analysis::{
    compare_spike_trains, read_raw_f32, read_spike_csv, voltage_rmse, SpikeComparison,
};
use spikebench::observability::{init_logging, parse_debug_flags, LoggingConfig};
use tracing::{info, warn};

/// Mismatched timesteps listed before truncating
const MAX_LISTED_STEPS: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "compare_runs", about = "Compare spike trains and voltage dumps of two runs")]
struct Cli {
    /// Spike CSV of the reference run
    left: PathBuf,

    /// Spike CSV of the run under test
    right: PathBuf,

    /// Field delimiter of both spike files
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Raw f32 voltage dumps to compare (reference, under test)
    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"])]
    voltages: Option<Vec<PathBuf>>,

    /// Largest acceptable voltage RMSE (mV)
    #[arg(long, default_value_t = 0.0)]
    max_rmse: f64,

    /// Write the comparison as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
struct Outcome {
    spikes: SpikeComparison,
    voltage_rmse: Option<f64>,
    identical: bool,
}

fn main() -> ExitCode {
    let debug_flags = parse_debug_flags();
    let args = std::env::args().filter(|a| !a.starts_with("--debug-"));
    let cli = Cli::parse_from(args);

    let _guard = match init_logging(&debug_flags, &LoggingConfig::default()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("compare_runs: {:#}", e);
            return ExitCode::from(2);
        }
    };

    match compare(&cli) {
        Ok(outcome) if outcome.identical => {
            info!(target: "spikebench", "Runs match");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("compare_runs: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn compare(cli: &Cli) -> Result<Outcome> {
    let left = read_spike_csv(&cli.left, &cli.delimiter)?;
    let right = read_spike_csv(&cli.right, &cli.delimiter)?;
    let spikes = compare_spike_trains(&left, &right);
    info!(
        target: "spikebench",
        "Spikes: {} vs {}, {} matched, {} mismatched steps",
        spikes.left_spikes,
        spikes.right_spikes,
        spikes.matched,
        spikes.mismatched_steps.len()
    );
    for t in spikes.mismatched_steps.iter().take(MAX_LISTED_STEPS) {
        warn!(target: "spikebench", "Spike mismatch at t={} ms", t);
    }
    if spikes.mismatched_steps.len() > MAX_LISTED_STEPS {
        warn!(
            target: "spikebench",
            "... and {} more",
            spikes.mismatched_steps.len() - MAX_LISTED_STEPS
        );
    }

    let rmse = match cli.voltages.as_deref() {
        Some([l, r]) => {
            let rmse = voltage_rmse(&read_raw_f32(l)?, &read_raw_f32(r)?)?;
            info!(target: "spikebench", "Voltage RMSE: {:.6e} mV", rmse);
            if rmse > cli.max_rmse {
                warn!(
                    target: "spikebench",
                    "Voltage RMSE {:.6e} exceeds {:.6e}",
                    rmse,
                    cli.max_rmse
                );
            }
            Some(rmse)
        }
        _ => None,
    };

    let identical = spikes.is_identical() && rmse.map_or(true, |r| r <= cli.max_rmse);
    let outcome = Outcome {
        spikes,
        voltage_rmse: rmse,
        identical,
    };
    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(outcome)
}
