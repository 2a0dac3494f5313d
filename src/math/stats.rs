//! NaN-aware summary statistics over fields.

use crate::domain::{Field, FieldStats};

/// Statistics over the finite entries of `field`.
///
/// `min`/`max`/`mean`/`std` are NaN when no entry is finite.
pub fn field_stats(field: &Field) -> FieldStats {
    let mut n_valid = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in field.iter().filter(|v| v.is_finite()) {
        n_valid += 1;
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }

    if n_valid == 0 {
        return FieldStats {
            n_total: field.len(),
            n_valid,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std: f64::NAN,
        };
    }

    let mean = sum / n_valid as f64;
    let var = field
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| (v - mean) * (v - mean))
        .sum::<f64>()
        / n_valid as f64;

    FieldStats {
        n_total: field.len(),
        n_valid,
        min,
        max,
        mean,
        std: var.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ignores_nan_and_infinite_entries() {
        let field = Field::from_row_slice(2, 2, &[1.0, f64::NAN, 3.0, f64::INFINITY]);
        let stats = field_stats(&field);
        assert_eq!(stats.n_total, 4);
        assert_eq!(stats.n_valid, 2);
        assert_relative_eq!(stats.mean, 2.0);
        assert_relative_eq!(stats.std, 1.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn empty_field_is_nan() {
        let field = Field::from_element(2, 2, f64::NAN);
        let stats = field_stats(&field);
        assert_eq!(stats.n_valid, 0);
        assert!(stats.mean.is_nan());
    }
}
