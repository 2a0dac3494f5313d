//! Candidate temperature axis.
//!
//! The synthetic model is indexed by an evenly spaced log-T axis
//! `t0, t0 + step, ..., t_max`. Values are computed as `t0 + i * step` rather
//! than accumulated, so the same inputs always give bit-identical axes.

use serde::{Deserialize, Serialize};

use crate::fit::FitError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAxis {
    t0: f64,
    step: f64,
    values: Vec<f64>,
}

impl TemperatureAxis {
    /// Axis from `t0` to `t_max` inclusive.
    ///
    /// The point count is `round((t_max - t0) / step) + 1`, so a `t_max` that is
    /// off the grid by rounding noise still lands on the last point.
    pub fn new(t0: f64, t_max: f64, step: f64) -> Result<Self, FitError> {
        if !(t0.is_finite() && t_max.is_finite() && step.is_finite() && step > 0.0 && t_max > t0) {
            return Err(FitError::InvalidAxis { t0, t_max, step });
        }
        let n = ((t_max - t0) / step).round() as usize + 1;
        Ok(Self::with_len(t0, step, n))
    }

    /// Axis with exactly `len` points.
    pub fn with_len(t0: f64, step: f64, len: usize) -> Self {
        let values = (0..len).map(|i| t0 + i as f64 * step).collect();
        Self { t0, step, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn t_max(&self) -> f64 {
        self.values.last().copied().unwrap_or(self.t0)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}
