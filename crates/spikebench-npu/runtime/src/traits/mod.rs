// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine boundary traits

pub mod engine;

pub use crate::error::{Result, RuntimeError};
pub use engine::{Engine, HostView, PhaseTimings, PullRequest, StateVariable};
