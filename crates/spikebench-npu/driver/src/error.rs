// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Driver error types

use spikebench_npu_runtime::RuntimeError;
use thiserror::Error;

use crate::driver::DriverState;
use crate::recorder::RecorderError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: DriverState,
    },

    #[error("Engine error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Invalid run duration: {0} ms")]
    InvalidDuration(f64),

    #[error("{kind} recorder observes population {handle} which is not in the network")]
    UnknownPopulation { kind: &'static str, handle: u32 },
}

pub type Result<T> = std::result::Result<T, DriverError>;
