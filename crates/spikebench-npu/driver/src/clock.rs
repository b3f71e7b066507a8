// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation clock
//!
//! Time is derived from the step count rather than accumulated, so it never
//! drifts however many steps are taken. A timestep written with few decimal
//! digits (0.1, 0.025) is held as an integer number of decimal ticks, and
//! `t = steps × ticks / 10^k` is one correctly rounded division, so recorded
//! times print as `0.3` rather than carrying f32 widening noise.

use spikebench_npu_neural::Scalar;

/// Most decimal digits a timestep is resolved to
const MAX_DECIMALS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    dt: f64,
    /// `dt × 10^k` when that is a whole number for some `k ≤ MAX_DECIMALS`
    ticks_per_step: Option<u64>,
    ticks_per_ms: f64,
    steps: u64,
}

impl SimulationClock {
    pub fn new(dt: Scalar) -> Self {
        // Shortest decimal that round-trips the f32, e.g. 0.1f32 -> 0.1
        let dt = dt.to_string().parse::<f64>().unwrap_or(dt as f64);
        Self::with_dt(dt)
    }

    pub fn with_dt(dt: f64) -> Self {
        let decimal = (0..=MAX_DECIMALS).find_map(|k| {
            let scale = 10f64.powi(k);
            let ticks = (dt * scale).round();
            let exact = ticks > 0.0 && ticks < u32::MAX as f64 && ticks / scale == dt;
            exact.then_some((ticks as u64, scale))
        });
        Self {
            dt,
            ticks_per_step: decimal.map(|(ticks, _)| ticks),
            ticks_per_ms: decimal.map_or(1.0, |(_, scale)| scale),
            steps: 0,
        }
    }

    /// Current simulation time (ms)
    #[inline]
    pub fn t(&self) -> f64 {
        self.time_at(self.steps)
    }

    #[inline]
    fn time_at(&self, steps: u64) -> f64 {
        match self.ticks_per_step {
            Some(ticks) => steps.saturating_mul(ticks) as f64 / self.ticks_per_ms,
            None => steps as f64 * self.dt,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Steps taken since the last reset
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn advance(&mut self) {
        self.steps += 1;
    }

    pub fn reset(&mut self) {
        self.steps = 0;
    }

    /// Steps `run(duration)` will take from t = 0
    pub fn steps_for(&self, duration: f64) -> u64 {
        let estimate = (duration / self.dt).floor().max(0.0) as u64;
        // Land on the first step whose time reaches the duration
        let mut steps = estimate.saturating_sub(1);
        while self.time_at(steps) < duration {
            steps += 1;
        }
        while steps > 0 && self.time_at(steps - 1) >= duration {
            steps -= 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_is_steps_times_dt() {
        let mut clock = SimulationClock::new(0.1);
        for _ in 0..10_000 {
            clock.advance();
        }
        assert_eq!(clock.steps(), 10_000);
        assert!((clock.t() - 1000.0).abs() < 1e-3);
        clock.reset();
        assert_eq!(clock.t(), 0.0);
    }

    #[test]
    fn test_steps_for_duration() {
        assert_eq!(SimulationClock::new(1.0).steps_for(1000.0), 1000);
        assert_eq!(SimulationClock::new(1.0).steps_for(0.0), 0);
        assert_eq!(SimulationClock::new(1.0).steps_for(2.5), 3);
        assert_eq!(SimulationClock::new(0.5).steps_for(10.0), 20);
        assert_eq!(SimulationClock::new(0.1).steps_for(100.0), 1000);
    }

    #[test]
    fn test_decimal_timestep_gives_clean_times() {
        let mut clock = SimulationClock::new(0.1);
        assert_eq!(clock.dt(), 0.1);
        let mut printed = Vec::new();
        for _ in 0..3 {
            clock.advance();
            printed.push(clock.t().to_string());
        }
        assert_eq!(printed, ["0.1", "0.2", "0.3"]);

        let mut clock = SimulationClock::new(0.025);
        for _ in 0..7 {
            clock.advance();
        }
        assert_eq!(clock.t(), 0.175);
    }

    #[test]
    fn test_non_decimal_timestep_falls_back_to_product() {
        let mut clock = SimulationClock::with_dt(1.0 / 3.0);
        clock.advance();
        clock.advance();
        clock.advance();
        assert!((clock.t() - 1.0).abs() < 1e-12);
    }
}
