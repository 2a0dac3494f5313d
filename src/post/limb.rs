//! Off-limb masking.

use crate::domain::{DiskGeometry, Field};

/// Set every pixel further than `multiplier * radius` from the disk center to
/// NaN. Pixels inside are left untouched. Returns the number of masked pixels.
pub fn mask_off_limb(field: &mut Field, disk: &DiskGeometry, multiplier: f64) -> usize {
    let limit = disk.radius_px * multiplier;
    let mut masked = 0;
    for col in 0..field.ncols() {
        for row in 0..field.nrows() {
            if disk.radial_distance(row, col) > limit {
                field[(row, col)] = f64::NAN;
                masked += 1;
            }
        }
    }
    log::debug!("Masked {masked} off-limb pixels (r > {limit:.1} px)");
    masked
}
