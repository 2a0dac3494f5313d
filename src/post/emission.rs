//! Quantities derived from a fitted temperature map.
//!
//! With the temperature known, a single channel's intensity gives an emission
//! measure estimate `EM = I / R_c(T)`, where `R_c(T)` is looked up on the
//! response grid by floor index (clamped to the grid). A column density follows
//! from an assumed line-of-sight depth: `n = sqrt(EM / depth)`.

use crate::domain::{Field, TemperatureMap, TemperatureScale};
use crate::fit::FitError;
use crate::math::convert_value;
use crate::models::ResponseTable;

/// Emission measure from one channel.
///
/// `intensity` must be the exposure-corrected (not reference-normalized) image
/// of `channel`. NaN temperatures and zero responses give NaN.
pub fn emission_measure(
    temperature: &TemperatureMap,
    intensity: &Field,
    responses: &ResponseTable,
    channel: usize,
) -> Result<Field, FitError> {
    let Some(curve) = responses.curve(channel) else {
        return Err(FitError::ChannelMismatch {
            expected: channel + 1,
            found: responses.n_channels(),
        });
    };
    if intensity.shape() != temperature.shape() {
        return Err(FitError::ShapeMismatch {
            channel,
            expected: temperature.shape(),
            found: intensity.shape(),
        });
    }

    let scale = temperature.scale();
    Ok(temperature.data.zip_map(intensity, |t, i| {
        let log_t = convert_value(t, scale, TemperatureScale::Log);
        if !log_t.is_finite() {
            return f64::NAN;
        }
        let r = curve.values[responses.index_for(log_t)];
        if r > 0.0 { i / r } else { f64::NAN }
    }))
}

/// Average of the per-channel emission measures.
///
/// A pixel that is NaN in any channel is NaN in the result.
pub fn mean_emission_measure(
    temperature: &TemperatureMap,
    intensities: &[(usize, &Field)],
    responses: &ResponseTable,
) -> Result<Field, FitError> {
    let (rows, cols) = temperature.shape();
    if intensities.is_empty() {
        return Ok(Field::from_element(rows, cols, f64::NAN));
    }
    let mut total = Field::zeros(rows, cols);
    for &(channel, intensity) in intensities {
        total += emission_measure(temperature, intensity, responses, channel)?;
    }
    Ok(total / intensities.len() as f64)
}

/// Column density for a line-of-sight depth in cm.
pub fn column_density(emission_measure: &Field, depth_cm: f64) -> Field {
    emission_measure.map(|em| {
        if em > 0.0 && depth_cm > 0.0 {
            (em / depth_cm).sqrt()
        } else {
            f64::NAN
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MapMeta;
    use crate::models::ResponseCurve;
    use approx::assert_relative_eq;

    fn responses() -> ResponseTable {
        ResponseTable::new(
            6.0,
            0.1,
            vec![
                ResponseCurve { name: "a".into(), values: vec![2.0, 4.0, 0.0, 8.0] },
                ResponseCurve { name: "b".into(), values: vec![1.0, 1.0, 1.0, 1.0] },
            ],
        )
        .unwrap()
    }

    fn tmap(values: &[f64]) -> TemperatureMap {
        TemperatureMap::new(Field::from_row_slice(1, values.len(), values), MapMeta::default())
    }

    #[test]
    fn floor_lookup_with_clamping() {
        let t = tmap(&[6.05, 6.15, 5.0, 9.0]);
        let i = Field::from_element(1, 4, 16.0);
        let em = emission_measure(&t, &i, &responses(), 0).unwrap();
        assert_relative_eq!(em[(0, 0)], 8.0); // index 0
        assert_relative_eq!(em[(0, 1)], 4.0); // index 1
        assert_relative_eq!(em[(0, 2)], 8.0); // clamped to 0
        assert_relative_eq!(em[(0, 3)], 2.0); // clamped to 3
    }

    #[test]
    fn nan_temperature_and_zero_response_give_nan() {
        let t = tmap(&[f64::NAN, 6.25]);
        let i = Field::from_element(1, 2, 1.0);
        let em = emission_measure(&t, &i, &responses(), 0).unwrap();
        assert!(em[(0, 0)].is_nan());
        assert!(em[(0, 1)].is_nan());
    }

    #[test]
    fn linear_maps_are_looked_up_on_log_scale() {
        let mut t = tmap(&[6.15]);
        t.convert_scale(TemperatureScale::Linear);
        let i = Field::from_element(1, 1, 4.0);
        let em = emission_measure(&t, &i, &responses(), 0).unwrap();
        assert_relative_eq!(em[(0, 0)], 1.0);
    }

    #[test]
    fn mean_over_channels() {
        let t = tmap(&[6.05]);
        let a = Field::from_element(1, 1, 4.0);
        let b = Field::from_element(1, 1, 3.0);
        let em = mean_emission_measure(&t, &[(0, &a), (1, &b)], &responses()).unwrap();
        assert_relative_eq!(em[(0, 0)], (2.0 + 3.0) / 2.0);
    }

    #[test]
    fn density_from_depth() {
        let em = Field::from_row_slice(1, 2, &[4e20, -1.0]);
        let n = column_density(&em, 1e10);
        assert_relative_eq!(n[(0, 0)], 2e5, max_relative = 1e-12);
        assert!(n[(0, 1)].is_nan());
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let t = tmap(&[6.0]);
        let i = Field::from_element(1, 1, 1.0);
        assert!(emission_measure(&t, &i, &responses(), 5).is_err());
    }
}
