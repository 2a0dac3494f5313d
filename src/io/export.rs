//! Export fitted maps.
//!
//! An output directory holds:
//! - `temperature.csv`: the temperature grid on the map's scale
//! - `goodness.csv`: the minimized residual per pixel
//! - `meta.json`: map metadata and summary statistics
//!
//! The grids go through `io::image`, so they read back with `read_field_csv`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Field, FieldStats, MapMeta, TemperatureMap};
use crate::error::AppError;
use crate::io::image::write_field_csv;
use crate::math::field_stats;

pub const TEMPERATURE_FILE: &str = "temperature.csv";
pub const GOODNESS_FILE: &str = "goodness.csv";
pub const META_FILE: &str = "meta.json";

/// JSON sidecar written next to the grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSidecar {
    pub tool: String,
    pub meta: MapMeta,
    pub unit: String,
    pub rows: usize,
    pub cols: usize,
    pub temperature: FieldStats,
    pub goodness: FieldStats,
}

/// Paths of the files written by [`write_map`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub temperature: PathBuf,
    pub goodness: PathBuf,
    pub meta: PathBuf,
}

/// Write the temperature map, its goodness field and the sidecar into `dir`.
pub fn write_map(dir: &Path, map: &TemperatureMap, goodness: &Field) -> Result<ExportPaths, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::config(format!("Failed to create output dir '{}': {e}", dir.display())))?;

    let paths = ExportPaths {
        temperature: dir.join(TEMPERATURE_FILE),
        goodness: dir.join(GOODNESS_FILE),
        meta: dir.join(META_FILE),
    };

    write_field_csv(&paths.temperature, &map.data)?;
    write_field_csv(&paths.goodness, goodness)?;

    let (rows, cols) = map.shape();
    let sidecar = MapSidecar {
        tool: env!("CARGO_PKG_NAME").to_string(),
        meta: map.meta.clone(),
        unit: map.scale().unit_label().to_string(),
        rows,
        cols,
        temperature: field_stats(&map.data),
        goodness: field_stats(goodness),
    };
    let file = File::create(&paths.meta)
        .map_err(|e| AppError::config(format!("Failed to create '{}': {e}", paths.meta.display())))?;
    serde_json::to_writer_pretty(file, &sidecar)
        .map_err(|e| AppError::config(format!("Failed to write map metadata: {e}")))?;

    log::info!("Wrote {rows}x{cols} temperature map to {}", dir.display());
    Ok(paths)
}

/// Read a sidecar back.
pub fn read_sidecar(path: &Path) -> Result<MapSidecar, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::config(format!("Invalid map metadata: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TemperatureScale;
    use crate::io::image::read_field_csv;

    #[test]
    fn writes_grids_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let map = TemperatureMap::new(
            Field::from_row_slice(2, 2, &[6.0, 6.2, f64::NAN, 6.4]),
            MapMeta::default(),
        );
        let goodness = Field::from_row_slice(2, 2, &[0.1, 0.0, f64::INFINITY, 0.3]);

        let paths = write_map(&out, &map, &goodness).unwrap();

        let t = read_field_csv(&paths.temperature).unwrap();
        assert_eq!(t[(0, 1)], 6.2);
        assert!(t[(1, 0)].is_nan());

        let side = read_sidecar(&paths.meta).unwrap();
        assert_eq!(side.rows, 2);
        assert_eq!(side.meta.scale, TemperatureScale::Log);
        assert_eq!(side.unit, "log10(K)");
        assert_eq!(side.temperature.n_valid, 3);
        assert_eq!(side.goodness.n_valid, 3);
    }

    #[test]
    fn all_missing_map_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let map = TemperatureMap::new(Field::from_element(2, 2, f64::NAN), MapMeta::default());
        let goodness = Field::from_element(2, 2, f64::INFINITY);

        let paths = write_map(dir.path(), &map, &goodness).unwrap();
        let side = read_sidecar(&paths.meta).unwrap();
        assert_eq!(side.temperature.n_total, 4);
        assert_eq!(side.temperature.n_valid, 0);
        assert!(side.temperature.mean.is_nan());
        assert!(side.goodness.min.is_nan());
    }
}
