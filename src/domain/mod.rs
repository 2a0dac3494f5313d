//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - 2-D fields and their metadata (`Field`, `MapMeta`, `DiskGeometry`, `TemperatureMap`)
//! - the temperature scale a field is expressed on (`TemperatureScale`)
//! - per-channel acquisition metadata (`ChannelMeta`)
//! - the run configuration (`TempMapConfig`)

pub mod config;
pub mod map;
pub mod types;

pub use config::*;
pub use map::*;
pub use types::*;
