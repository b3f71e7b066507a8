// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Outside the refractory window (RefracTime <= 0):
//!     alpha = (I_syn + I_offset) × R_m + V_rest        R_m = TauM / C
//!     V(t+dt) = alpha − exp(−dt / TauM) × (alpha − V(t))
//!
//! Inside the refractory window:
//!     RefracTime −= dt                                 (V stays at V_reset)
//!
//! Firing Check:
//!     if RefracTime <= 0 and V >= V_thresh:
//!         FIRE, V = V_reset, RefracTime = TauRefrac
//! ```
//!
//! The membrane equation is integrated exactly for constant input over the
//! step, so results do not depend on how small `dt` is relative to `TauM`.

use serde::{Deserialize, Serialize};

use super::traits::NeuronModel;
use crate::types::{NeuralError, Result, Scalar};

/// LIF model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifParameters {
    /// Membrane capacitance (nF)
    pub capacitance: Scalar,

    /// Membrane time constant (ms)
    pub tau_m: Scalar,

    /// Resting potential (mV)
    pub v_rest: Scalar,

    /// Reset potential after a spike (mV)
    pub v_reset: Scalar,

    /// Spike threshold (mV)
    pub v_thresh: Scalar,

    /// Constant offset current (nA)
    pub i_offset: Scalar,

    /// Refractory period (ms)
    pub tau_refrac: Scalar,
}

impl Default for LifParameters {
    fn default() -> Self {
        Self {
            capacitance: 1.0,
            tau_m: 20.0,
            v_rest: -49.0,
            v_reset: -60.0,
            v_thresh: -50.0,
            i_offset: 0.0,
            tau_refrac: 5.0,
        }
    }
}

/// Timestep-dependent LIF constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifDerived {
    /// exp(−dt / TauM)
    pub exp_tc: Scalar,

    /// Membrane resistance TauM / C
    pub r_membrane: Scalar,
}

impl NeuronModel for LifParameters {
    type Derived = LifDerived;

    fn model_name(&self) -> &'static str {
        "Leaky Integrate-and-Fire (LIF)"
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason| NeuralError::InvalidParameter {
            model: "LIF",
            reason,
        };
        if !(self.capacitance > 0.0) {
            return Err(invalid("capacitance must be > 0"));
        }
        if !(self.tau_m > 0.0) {
            return Err(invalid("membrane time constant must be > 0"));
        }
        if !(self.tau_refrac >= 0.0) {
            return Err(invalid("refractory period must be >= 0"));
        }
        if !(self.v_reset < self.v_thresh) {
            return Err(invalid("reset potential must be below threshold"));
        }
        Ok(())
    }

    fn derive(&self, dt: Scalar) -> LifDerived {
        LifDerived {
            exp_tc: (-dt / self.tau_m).exp(),
            r_membrane: self.tau_m / self.capacitance,
        }
    }

    #[inline(always)]
    fn update(
        &self,
        derived: &LifDerived,
        v: &mut Scalar,
        refractory_time: &mut Scalar,
        input_current: Scalar,
        dt: Scalar,
    ) -> bool {
        if *refractory_time <= 0.0 {
            let alpha = (input_current + self.i_offset) * derived.r_membrane + self.v_rest;
            *v = alpha - derived.exp_tc * (alpha - *v);
        } else {
            *refractory_time -= dt;
        }

        if *refractory_time <= 0.0 && *v >= self.v_thresh {
            *v = self.v_reset;
            *refractory_time = self.tau_refrac;
            true
        } else {
            false
        }
    }
}
