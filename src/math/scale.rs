//! Temperature scale conversion.
//!
//! - log scale: `log10(T / K)`
//! - linear scale: `T` in MK
//!
//! `to_linear(to_log(x)) == x` and `to_log(to_linear(x)) == x` up to rounding
//! for every positive `x`. Non-positive or NaN inputs map to NaN on the log scale.

use crate::domain::{Field, TemperatureScale};

const KELVIN_PER_MK: f64 = 1.0e6;

/// log10(K) -> MK.
pub fn to_linear(log_t: f64) -> f64 {
    10f64.powf(log_t) / KELVIN_PER_MK
}

/// MK -> log10(K).
pub fn to_log(t_mk: f64) -> f64 {
    if t_mk > 0.0 {
        (t_mk * KELVIN_PER_MK).log10()
    } else {
        f64::NAN
    }
}

/// Convert one value from `from` to `to`. Same scale is the identity.
pub fn convert_value(value: f64, from: TemperatureScale, to: TemperatureScale) -> f64 {
    match (from, to) {
        (TemperatureScale::Log, TemperatureScale::Linear) => to_linear(value),
        (TemperatureScale::Linear, TemperatureScale::Log) => to_log(value),
        _ => value,
    }
}

/// Convert a whole field in place.
pub fn convert_field(field: &mut Field, from: TemperatureScale, to: TemperatureScale) {
    if from == to {
        return;
    }
    field.apply(|v| *v = convert_value(*v, from, to));
}
