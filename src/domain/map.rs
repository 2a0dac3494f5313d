//! Temperature map: a field plus its metadata.

use crate::domain::{Field, MapMeta, TemperatureScale};
use crate::math::convert_field;

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureMap {
    pub data: Field,
    pub meta: MapMeta,
}

impl TemperatureMap {
    pub fn new(data: Field, meta: MapMeta) -> Self {
        Self { data, meta }
    }

    pub fn scale(&self) -> TemperatureScale {
        self.meta.scale
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Re-express the map on `scale`. A no-op when already there.
    pub fn convert_scale(&mut self, scale: TemperatureScale) {
        if self.meta.scale == scale {
            log::debug!("Temperatures are already on a {scale:?} scale.");
            return;
        }
        convert_field(&mut self.data, self.meta.scale, scale);
        self.meta.scale = scale;
    }

    /// Copy with every value outside the open interval `(min, max)` set to NaN.
    pub fn select_range(&self, min: f64, max: f64) -> Self {
        let data = self
            .data
            .map(|v| if v > min && v < max { v } else { f64::NAN });
        Self {
            data,
            meta: self.meta.clone(),
        }
    }
}
