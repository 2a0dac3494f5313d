//! Shared domain types.
//!
//! Fields are plain `nalgebra` matrices indexed `(row, col)` = `(y, x)`.
//! Metadata travels next to the data rather than inside a map abstraction, so
//! plotting, serialization and coordinate handling stay separate collaborators.

use chrono::NaiveDateTime;
use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Deserializer, Serialize};

/// A 2-D numeric field (H rows × W columns).
pub type Field = DMatrix<f64>;

/// Instrument tag written into exported temperature maps.
pub const TEMPERATURE_INSTRUMENT: &str = "temperature";

/// Which scale temperature values are expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureScale {
    /// log10 of the temperature in Kelvin (the fitter's native output).
    Log,
    /// Temperature in MK.
    Linear,
}

impl TemperatureScale {
    pub fn unit_label(self) -> &'static str {
        match self {
            TemperatureScale::Log => "log10(K)",
            TemperatureScale::Linear => "MK",
        }
    }
}

/// Acquisition metadata for one spectral channel.
///
/// Only used by stack normalization and carried through to exports; the fit
/// itself never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub name: String,
    /// Exposure time in seconds.
    pub exposure_time: f64,
    pub acquired_at: Option<NaiveDateTime>,
}

impl ChannelMeta {
    pub fn new(name: impl Into<String>, exposure_time: f64) -> Self {
        Self {
            name: name.into(),
            exposure_time,
            acquired_at: None,
        }
    }
}

/// Solar disk position in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskGeometry {
    /// Column of the disk center.
    pub center_x: f64,
    /// Row of the disk center.
    pub center_y: f64,
    /// Solar radius in pixels.
    pub radius_px: f64,
}

impl DiskGeometry {
    /// Radial pixel distance of `(row, col)` from the disk center.
    pub fn radial_distance(&self, row: usize, col: usize) -> f64 {
        let dx = col as f64 - self.center_x;
        let dy = row as f64 - self.center_y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Metadata propagated from the input stack to the output maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMeta {
    pub instrument: String,
    pub date_obs: Option<NaiveDateTime>,
    pub scale: TemperatureScale,
    /// Channel whose metadata the map inherits (the normalization reference).
    pub reference_channel: Option<ChannelMeta>,
    pub disk: Option<DiskGeometry>,
}

impl Default for MapMeta {
    fn default() -> Self {
        Self {
            instrument: TEMPERATURE_INSTRUMENT.to_string(),
            date_obs: None,
            scale: TemperatureScale::Log,
            reference_channel: None,
            disk: None,
        }
    }
}

/// Per-run statistics for a field, ignoring NaNs.
///
/// With no valid entries the moments are NaN. JSON has no NaN, so they are
/// written as `null` and read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub n_total: usize,
    pub n_valid: usize,
    #[serde(deserialize_with = "nan_if_null")]
    pub min: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub max: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub mean: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub std: f64,
}

fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
