//! Synthetic emission lookup table.
//!
//! For every candidate temperature `t` on the axis we assume a Gaussian DEM
//! centered at `t`, fold it through each channel's response curve and integrate:
//!
//! ```text
//! I_c(t) = Σ_k R_c(logT_k) · DEM_t(logT_k) · ΔlogT
//! ```
//!
//! Each row is then divided by the reference channel, which is exactly the
//! normalization applied to the observed images, so model rows and pixel
//! vectors can be compared directly.

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TempMapConfig;
use crate::fit::TemperatureAxis;
use crate::models::{DemProfile, ResponseTable};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model expects {expected} channels, response table has {found}")]
    ChannelCount { expected: usize, found: usize },

    #[error("reference channel {reference} out of range for {n_channels} channels")]
    ReferenceChannel { reference: usize, n_channels: usize },

    #[error("reference channel has no signal at log T = {log_t:.3} (row {index})")]
    DegenerateRow { index: usize, log_t: f64 },

    #[error("table holds {found} values, expected {expected}")]
    TableSize { expected: usize, found: usize },
}

/// Everything a cached table must agree on to be reusable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelKey {
    pub n_temps: usize,
    pub n_channels: usize,
    pub t0: f64,
    pub t_step: f64,
    pub reference_channel: usize,
    pub dem_width: f64,
    pub dem_amplitude: f64,
}

impl ModelKey {
    pub fn new(
        axis: &TemperatureAxis,
        n_channels: usize,
        reference_channel: usize,
        dem_width: f64,
        dem_amplitude: f64,
    ) -> Self {
        Self {
            n_temps: axis.len(),
            n_channels,
            t0: axis.t0(),
            t_step: axis.step(),
            reference_channel,
            dem_width,
            dem_amplitude,
        }
    }

    pub fn from_config(config: &TempMapConfig, axis: &TemperatureAxis) -> Self {
        Self::new(
            axis,
            config.n_channels,
            config.reference_channel,
            config.dem_width,
            config.dem_amplitude,
        )
    }

    pub fn axis(&self) -> TemperatureAxis {
        TemperatureAxis::with_len(self.t0, self.t_step, self.n_temps)
    }

    /// Cache file name; encodes shape and dtype.
    pub fn file_name(&self) -> String {
        format!("synth_emiss_1pars_{}x{}_f32.bin", self.n_temps, self.n_channels)
    }
}

/// Where a model handed out by the builder came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    Cache,
    Built,
}

/// Dense `[temperature, channel]` table of normalized expected intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthModel {
    key: ModelKey,
    axis: TemperatureAxis,
    table: DMatrix<f32>,
}

impl SynthModel {
    /// Wrap a row-major value buffer (as read from the cache).
    pub fn from_row_major(key: ModelKey, values: &[f32]) -> Result<Self, ModelError> {
        let expected = key.n_temps * key.n_channels;
        if values.len() != expected {
            return Err(ModelError::TableSize {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            key,
            axis: key.axis(),
            table: DMatrix::from_row_slice(key.n_temps, key.n_channels, values),
        })
    }

    pub fn key(&self) -> &ModelKey {
        &self.key
    }

    pub fn axis(&self) -> &TemperatureAxis {
        &self.axis
    }

    pub fn n_temps(&self) -> usize {
        self.table.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.table.ncols()
    }

    pub fn reference_channel(&self) -> usize {
        self.key.reference_channel
    }

    pub fn table(&self) -> &DMatrix<f32> {
        &self.table
    }

    pub fn value(&self, temp_index: usize, channel: usize) -> f64 {
        self.table[(temp_index, channel)] as f64
    }

    /// Row `temp_index` widened to f64.
    pub fn row(&self, temp_index: usize) -> Vec<f64> {
        (0..self.n_channels())
            .map(|c| self.value(temp_index, c))
            .collect()
    }

    /// Table flattened row by row (the on-disk layout).
    pub fn to_row_major(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.table.len());
        for r in 0..self.n_temps() {
            for c in 0..self.n_channels() {
                out.push(self.table[(r, c)]);
            }
        }
        out
    }
}

/// Raw (un-normalized) intensity per channel for one DEM.
pub fn expected_intensities(responses: &ResponseTable, dem: &DemProfile) -> Vec<f64> {
    let grid = responses.log_t_grid();
    let weights = dem.sample(&grid);
    let delta = responses.log_t_step();
    responses
        .curves()
        .iter()
        .map(|curve| {
            curve
                .values
                .iter()
                .zip(weights.iter())
                .map(|(r, w)| r * w)
                .sum::<f64>()
                * delta
        })
        .collect()
}

/// Build the table from scratch.
pub fn build_model(responses: &ResponseTable, key: &ModelKey) -> Result<SynthModel, ModelError> {
    if responses.n_channels() != key.n_channels {
        return Err(ModelError::ChannelCount {
            expected: key.n_channels,
            found: responses.n_channels(),
        });
    }
    if key.reference_channel >= key.n_channels {
        return Err(ModelError::ReferenceChannel {
            reference: key.reference_channel,
            n_channels: key.n_channels,
        });
    }

    let axis = key.axis();
    let reference = key.reference_channel;

    // Rows are independent; build them in parallel and keep axis order.
    let rows: Vec<Vec<f32>> = axis
        .values()
        .par_iter()
        .enumerate()
        .map(|(index, &mean)| {
            let dem = DemProfile::new(mean, key.dem_width, key.dem_amplitude);
            let raw = expected_intensities(responses, &dem);
            let norm = raw[reference];
            if !(norm.is_finite() && norm > 0.0) {
                return Err(ModelError::DegenerateRow { index, log_t: mean });
            }
            Ok(raw.iter().map(|v| (v / norm) as f32).collect())
        })
        .collect::<Result<_, _>>()?;

    let table = DMatrix::from_fn(key.n_temps, key.n_channels, |r, c| rows[r][c]);
    Ok(SynthModel {
        key: *key,
        axis,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseCurve;
    use approx::assert_relative_eq;

    /// Three channels peaking cool, mid and hot.
    fn responses() -> ResponseTable {
        let grid: Vec<f64> = (0..121).map(|i| 4.0 + i as f64 * 0.05).collect();
        let curve = |peak: f64| -> Vec<f64> {
            grid.iter()
                .map(|&lt| (-(lt - peak) * (lt - peak) / (2.0 * 0.3 * 0.3)).exp())
                .collect()
        };
        ResponseTable::new(
            4.0,
            0.05,
            vec![
                ResponseCurve { name: "cool".into(), values: curve(5.8) },
                ResponseCurve { name: "mid".into(), values: curve(6.2) },
                ResponseCurve { name: "hot".into(), values: curve(6.8) },
            ],
        )
        .unwrap()
    }

    fn key(reference: usize) -> ModelKey {
        let axis = TemperatureAxis::new(5.6, 7.0, 0.05).unwrap();
        ModelKey::new(&axis, 3, reference, 0.1, 1.0)
    }

    #[test]
    fn reference_column_is_exactly_one() {
        for reference in 0..3 {
            let model = build_model(&responses(), &key(reference)).unwrap();
            for t in 0..model.n_temps() {
                assert_eq!(model.value(t, reference), 1.0);
            }
        }
    }

    #[test]
    fn hot_channel_ratio_grows_with_temperature() {
        let model = build_model(&responses(), &key(1)).unwrap();
        let hot: Vec<f64> = (0..model.n_temps()).map(|t| model.value(t, 2)).collect();
        for w in hot.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn row_major_round_trip_preserves_table() {
        let model = build_model(&responses(), &key(1)).unwrap();
        let flat = model.to_row_major();
        let back = SynthModel::from_row_major(*model.key(), &flat).unwrap();
        assert_eq!(back, model);
        assert_relative_eq!(back.value(3, 0) as f32, flat[3 * 3]);
    }

    #[test]
    fn channel_count_must_match_responses() {
        let axis = TemperatureAxis::new(5.6, 7.0, 0.05).unwrap();
        let bad = ModelKey::new(&axis, 6, 2, 0.1, 1.0);
        assert!(matches!(
            build_model(&responses(), &bad),
            Err(ModelError::ChannelCount { expected: 6, found: 3 })
        ));
    }

    #[test]
    fn silent_reference_is_degenerate() {
        let mut curves = responses().curves().to_vec();
        curves[1].values.iter_mut().for_each(|v| *v = 0.0);
        let table = ResponseTable::new(4.0, 0.05, curves).unwrap();
        assert!(matches!(
            build_model(&table, &key(1)),
            Err(ModelError::DegenerateRow { .. })
        ));
    }
}
