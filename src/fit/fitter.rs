//! Per-pixel temperature fitting.
//!
//! Given:
//! - a normalized image stack (N channels, H×W)
//! - the synthetic table (T rows × N channels)
//! - the matching temperature axis (T values)
//!
//! we compare, for every pixel, the observed N-vector against each table row
//! and keep the row with the lowest residual:
//!
//! ```text
//! r(t) = Σ_c ((obs_c - m_tc) / m_tc)^2      over channels with m_tc > 0
//! ```
//!
//! The cost is O(H·W·T·N); pixels are independent and run in parallel.

use rayon::prelude::*;
use thiserror::Error;

use crate::data::ImageStack;
use crate::domain::{Field, MapMeta, TemperatureMap, TemperatureScale};
use crate::models::SynthModel;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("invalid temperature axis: t0={t0}, t_max={t_max}, step={step}")]
    InvalidAxis { t0: f64, t_max: f64, step: f64 },

    #[error("image stack is empty")]
    EmptyStack,

    #[error("channel {channel} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        channel: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("expected {expected} channels, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("temperature axis has {axis} values but the model has {rows} rows")]
    AxisMismatch { axis: usize, rows: usize },

    #[error("channel {channel} has invalid exposure time {exposure}")]
    BadExposure { channel: usize, exposure: f64 },
}

/// Best match for one observed vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelFit {
    /// Winning table row, `None` for missing data.
    pub index: Option<usize>,
    /// log10(K); NaN when `index` is `None`.
    pub log_t: f64,
    /// Minimized residual; `+inf` when `index` is `None`.
    pub residual: f64,
}

impl PixelFit {
    pub const MISSING: PixelFit = PixelFit {
        index: None,
        log_t: f64::NAN,
        residual: f64::INFINITY,
    };
}

/// Fitter output: the temperature map and the residual of the winning row.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub temperature: TemperatureMap,
    pub goodness: Field,
}

/// A zero or non-finite channel marks the whole pixel as missing.
pub fn is_missing(observed: &[f64]) -> bool {
    observed.iter().any(|v| !v.is_finite() || *v == 0.0)
}

/// Sum of squared relative differences between an observation and a model row.
///
/// Channels with a non-positive model value carry no information and are
/// skipped. A row with a non-finite entry can never win.
pub fn residual(observed: &[f64], model_row: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (&o, &m) in observed.iter().zip(model_row.iter()) {
        if !m.is_finite() {
            return f64::INFINITY;
        }
        if m > 0.0 {
            let d = (o - m) / m;
            sum += d * d;
        }
    }
    sum
}

/// Fit one observed vector against a row-major table.
///
/// Only rows that have a temperature on `axis` are candidates.
pub fn fit_vector(observed: &[f64], table: &[f64], axis: &[f64]) -> PixelFit {
    let n = observed.len();
    if n == 0 || is_missing(observed) {
        return PixelFit::MISSING;
    }

    let mut best = PixelFit::MISSING;
    for (index, (row, &log_t)) in table.chunks_exact(n).zip(axis.iter()).enumerate() {
        let r = residual(observed, row);
        // Strict `<` keeps the lowest index on ties.
        if r.is_finite() && r < best.residual {
            best = PixelFit {
                index: Some(index),
                log_t,
                residual: r,
            };
        }
    }
    best
}

/// Fit every pixel of `stack` against `model`.
///
/// Missing pixels come back as NaN temperature and `+inf` residual; they
/// never abort the run.
pub fn fit_pixels(
    stack: &ImageStack,
    model: &SynthModel,
    axis: &[f64],
) -> Result<FitOutput, FitError> {
    if axis.len() != model.n_temps() {
        return Err(FitError::AxisMismatch {
            axis: axis.len(),
            rows: model.n_temps(),
        });
    }
    if stack.n_channels() != model.n_channels() {
        return Err(FitError::ChannelMismatch {
            expected: model.n_channels(),
            found: stack.n_channels(),
        });
    }

    let n = model.n_channels();
    let (rows, cols) = stack.shape();

    // Widen once so the inner loop runs on contiguous f64 rows.
    let table: Vec<f64> = model.to_row_major().iter().map(|&v| v as f64).collect();

    // Linear index is column-major to match `Field::from_iterator`.
    let fits: Vec<PixelFit> = (0..rows * cols)
        .into_par_iter()
        .map_init(
            || vec![0.0; n],
            |observed, idx| {
                stack.pixel_into(idx % rows, idx / rows, observed.as_mut_slice());
                fit_vector(observed.as_slice(), &table, axis)
            },
        )
        .collect();

    let n_missing = fits.iter().filter(|f| f.index.is_none()).count();
    log::debug!(
        "Fitted {} pixels against {} candidates ({} missing)",
        fits.len(),
        axis.len(),
        n_missing
    );

    let temperature = Field::from_iterator(rows, cols, fits.iter().map(|f| f.log_t));
    let goodness = Field::from_iterator(rows, cols, fits.iter().map(|f| f.residual));

    let reference = stack.meta().get(model.reference_channel()).cloned();
    let meta = MapMeta {
        date_obs: reference.as_ref().and_then(|m| m.acquired_at),
        scale: TemperatureScale::Log,
        reference_channel: reference,
        ..MapMeta::default()
    };

    Ok(FitOutput {
        temperature: TemperatureMap::new(temperature, meta),
        goodness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChannelMeta;
    use crate::fit::TemperatureAxis;
    use crate::models::ModelKey;

    fn model() -> SynthModel {
        let axis = TemperatureAxis::new(6.0, 6.3, 0.1).unwrap();
        let key = ModelKey::new(&axis, 3, 1, 0.1, 1.0);
        #[rustfmt::skip]
        let rows = [
            2.0, 1.0, 0.1,
            1.5, 1.0, 0.3,
            1.0, 1.0, 0.9,
            0.5, 1.0, 2.0,
        ];
        SynthModel::from_row_major(key, &rows).unwrap()
    }

    fn stack_of(pixels: &[[f64; 3]]) -> ImageStack {
        let channels = (0..3)
            .map(|c| Field::from_iterator(1, pixels.len(), pixels.iter().map(|p| p[c])))
            .collect();
        let meta = (0..3).map(|c| ChannelMeta::new(format!("c{c}"), 1.0)).collect();
        ImageStack::new(channels, meta).unwrap()
    }

    #[test]
    fn exact_row_is_recovered_with_zero_residual() {
        let m = model();
        let stack = stack_of(&[[1.5, 1.0, 0.3], [0.5, 1.0, 2.0]]);
        let out = fit_pixels(&stack, &m, m.axis().values()).unwrap();
        assert!((out.temperature.data[(0, 0)] - 6.1).abs() < 1e-12);
        assert!((out.temperature.data[(0, 1)] - 6.3).abs() < 1e-12);
        assert!(out.goodness[(0, 0)].abs() < 1e-12);
        assert!(out.goodness[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn noisy_vector_picks_nearest_row() {
        let m = model();
        let stack = stack_of(&[[1.05, 1.0, 0.85]]);
        let out = fit_pixels(&stack, &m, m.axis().values()).unwrap();
        assert!((out.temperature.data[(0, 0)] - 6.2).abs() < 1e-12);
        assert!(out.goodness[(0, 0)] > 0.0);
    }

    #[test]
    fn missing_pixels_are_nan_never_zero() {
        let m = model();
        let stack = stack_of(&[
            [0.0, 0.0, 0.0],
            [1.0, f64::NAN, 0.9],
            [f64::INFINITY, 1.0, 0.9],
            [1.0, 1.0, 0.0],
        ]);
        let out = fit_pixels(&stack, &m, m.axis().values()).unwrap();
        for c in 0..4 {
            assert!(out.temperature.data[(0, c)].is_nan());
            assert_eq!(out.goodness[(0, c)], f64::INFINITY);
        }
    }

    #[test]
    fn saturated_pixel_has_no_good_fit() {
        let m = model();
        let stack = stack_of(&[[1e300, 1.0, 1e300]]);
        let out = fit_pixels(&stack, &m, m.axis().values()).unwrap();
        assert!(out.temperature.data[(0, 0)].is_nan());
        assert_eq!(out.goodness[(0, 0)], f64::INFINITY);
    }

    #[test]
    fn far_vector_still_gets_the_nearest_row() {
        let m = model();
        let table: Vec<f64> = m.to_row_major().iter().map(|&v| v as f64).collect();
        let fit = fit_vector(&[50.0, 1.0, 40.0], &table, m.axis().values());
        assert_eq!(fit.index, Some(2));
        assert!((fit.log_t - 6.2).abs() < 1e-12);
        assert!(fit.residual.is_finite() && fit.residual > 0.0);
    }

    #[test]
    fn short_axis_limits_the_candidates() {
        // Row 1 matches exactly but has no temperature on the axis.
        let table = [2.0, 1.0, 1.0, 1.0];
        let fit = fit_vector(&[1.0, 1.0], &table, &[5.0]);
        assert_eq!(fit.index, Some(0));
        assert_eq!(fit.log_t, 5.0);
        assert!(fit_vector(&[1.0, 1.0], &table, &[]).index.is_none());
    }

    #[test]
    fn ties_resolve_to_lowest_row() {
        let table = [1.0, 1.0, 1.0, 1.0];
        let fit = fit_vector(&[1.0, 1.0], &table, &[5.0, 6.0]);
        assert_eq!(fit.index, Some(0));
    }

    #[test]
    fn output_keeps_pixel_layout() {
        let m = model();
        // 2×2 image, each pixel a different row.
        let channels: Vec<Field> = (0..3)
            .map(|c| {
                Field::from_row_slice(2, 2, &[
                    m.value(0, c), m.value(1, c),
                    m.value(2, c), m.value(3, c),
                ])
            })
            .collect();
        let meta = (0..3).map(|c| ChannelMeta::new(format!("c{c}"), 1.0)).collect();
        let stack = ImageStack::new(channels, meta).unwrap();
        let out = fit_pixels(&stack, &m, m.axis().values()).unwrap();
        let expected = [[6.0, 6.1], [6.2, 6.3]];
        for r in 0..2 {
            for c in 0..2 {
                assert!((out.temperature.data[(r, c)] - expected[r][c]).abs() < 1e-9);
            }
        }
        assert_eq!(out.temperature.meta.reference_channel.as_ref().unwrap().name, "c1");
    }

    #[test]
    fn axis_length_must_match_model() {
        let m = model();
        let stack = stack_of(&[[1.0, 1.0, 1.0]]);
        assert!(matches!(
            fit_pixels(&stack, &m, &[6.0, 6.1]),
            Err(FitError::AxisMismatch { axis: 2, rows: 4 })
        ));
    }
}
