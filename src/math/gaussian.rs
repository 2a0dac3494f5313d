//! Gaussian profile in log-temperature.
//!
//! `g(x) = amp * exp(-(x - mean)^2 / (2 width^2))`
//!
//! When `amp == 1` the sampled profile is rescaled so its largest sample is
//! exactly 1, i.e. the profile is peak-normalized on the grid it is sampled on
//! (this matters when the mean falls between grid points).

/// Evaluate the Gaussian at a single point.
pub fn gaussian(x: f64, mean: f64, width: f64, amp: f64) -> f64 {
    let d = x - mean;
    amp * (-(d * d) / (2.0 * width * width)).exp()
}

/// Sample the Gaussian on `grid`.
pub fn sample_gaussian(grid: &[f64], mean: f64, width: f64, amp: f64) -> Vec<f64> {
    let mut out: Vec<f64> = grid.iter().map(|&x| gaussian(x, mean, width, amp)).collect();
    if amp == 1.0 {
        let peak = out.iter().copied().fold(0.0_f64, f64::max);
        if peak > 0.0 && peak.is_finite() {
            for v in &mut out {
                *v /= peak;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_amplitude_is_peak_normalized_off_grid() {
        // Mean sits halfway between samples; the peak sample is still 1.
        let grid: Vec<f64> = (0..11).map(|i| 6.0 + i as f64 * 0.05).collect();
        let g = sample_gaussian(&grid, 6.225, 0.1, 1.0);
        let peak = g.iter().copied().fold(0.0, f64::max);
        assert_relative_eq!(peak, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn explicit_amplitude_is_kept() {
        let grid = [5.0, 6.0, 7.0];
        let g = sample_gaussian(&grid, 6.0, 0.5, 1e25);
        assert_relative_eq!(g[1], 1e25, max_relative = 1e-12);
        assert!(g[0] < g[1] && g[2] < g[1]);
    }
}
