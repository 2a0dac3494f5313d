//! Instrument temperature-response curves.
//!
//! All curves of a table share one evenly spaced log-T grid. Curves are
//! immutable once the table is built; the empirical correction produces a new
//! table rather than editing in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ResponseCorrection;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("failed to read response table '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("response table has no channels")]
    NoChannels,

    #[error("expected {expected} channels, response table has {found}")]
    ChannelCount { expected: usize, found: usize },

    #[error("response grid needs at least 2 samples and a positive step")]
    InvalidGrid,

    #[error("log-T column is not evenly spaced (sample {index})")]
    UnevenGrid { index: usize },

    #[error("channel '{name}' has {found} samples, grid has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("channel '{name}' does not fit in the grid (offset {offset} + {count} samples > {len})")]
    OutOfBounds {
        name: String,
        offset: usize,
        count: usize,
        len: usize,
    },

    #[error("channel '{name}' contains a non-finite or negative sample")]
    BadSample { name: String },
}

/// Sensitivity of one channel over the shared log-T grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    pub name: String,
    pub values: Vec<f64>,
}

/// A set of response curves sampled on `log_t_start + i * log_t_step`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    log_t_start: f64,
    log_t_step: f64,
    curves: Vec<ResponseCurve>,
}

impl ResponseTable {
    pub fn new(
        log_t_start: f64,
        log_t_step: f64,
        curves: Vec<ResponseCurve>,
    ) -> Result<Self, ResponseError> {
        if curves.is_empty() {
            return Err(ResponseError::NoChannels);
        }
        if !(log_t_start.is_finite() && log_t_step.is_finite() && log_t_step > 0.0) {
            return Err(ResponseError::InvalidGrid);
        }
        let len = curves[0].values.len();
        if len < 2 {
            return Err(ResponseError::InvalidGrid);
        }
        for c in &curves {
            if c.values.len() != len {
                return Err(ResponseError::LengthMismatch {
                    name: c.name.clone(),
                    expected: len,
                    found: c.values.len(),
                });
            }
            if c.values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(ResponseError::BadSample {
                    name: c.name.clone(),
                });
            }
        }
        Ok(Self {
            log_t_start,
            log_t_step,
            curves,
        })
    }

    pub fn n_channels(&self) -> usize {
        self.curves.len()
    }

    /// Number of samples per curve.
    pub fn len(&self) -> usize {
        self.curves[0].values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn log_t_start(&self) -> f64 {
        self.log_t_start
    }

    pub fn log_t_step(&self) -> f64 {
        self.log_t_step
    }

    pub fn curves(&self) -> &[ResponseCurve] {
        &self.curves
    }

    pub fn curve(&self, channel: usize) -> Option<&ResponseCurve> {
        self.curves.get(channel)
    }

    /// The log-T value of every grid sample.
    pub fn log_t_grid(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.log_t_start + i as f64 * self.log_t_step)
            .collect()
    }

    /// Floor index of `log_t` on the grid, clamped to `[0, len - 1]`.
    pub fn index_for(&self, log_t: f64) -> usize {
        let raw = ((log_t - self.log_t_start) / self.log_t_step).floor();
        if raw <= 0.0 || raw.is_nan() {
            0
        } else {
            (raw as usize).min(self.len() - 1)
        }
    }

    /// Return a copy with `correction` applied.
    ///
    /// Samples strictly below `below_log_t` are multiplied by `factor`.
    pub fn with_correction(&self, correction: &ResponseCorrection) -> Self {
        let mut out = self.clone();
        let grid = self.log_t_grid();
        if let Some(curve) = out.curves.get_mut(correction.channel) {
            for (v, &lt) in curve.values.iter_mut().zip(grid.iter()) {
                if lt < correction.below_log_t {
                    *v *= correction.factor;
                }
            }
        }
        out
    }

    /// Check the channel count against the configured one.
    pub fn expect_channels(&self, expected: usize) -> Result<(), ResponseError> {
        if self.n_channels() != expected {
            return Err(ResponseError::ChannelCount {
                expected,
                found: self.n_channels(),
            });
        }
        Ok(())
    }
}
