//! Differential emission measure profile.

use serde::{Deserialize, Serialize};

use crate::math::sample_gaussian;

/// Gaussian DEM in log T.
///
/// For the single-parameter model only `mean` varies; `width` and `amplitude`
/// come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemProfile {
    pub mean: f64,
    pub width: f64,
    pub amplitude: f64,
}

impl DemProfile {
    pub fn new(mean: f64, width: f64, amplitude: f64) -> Self {
        Self {
            mean,
            width,
            amplitude,
        }
    }

    /// Sample the profile on a log-T grid.
    pub fn sample(&self, log_t_grid: &[f64]) -> Vec<f64> {
        sample_gaussian(log_t_grid, self.mean, self.width, self.amplitude)
    }
}
