//! `coronatemps` library crate.
//!
//! Per-pixel coronal temperature maps from multi-channel EUV images, by
//! matching observed channel ratios against a table of synthetic ratios
//! computed from instrument response curves and a Gaussian DEM.
//!
//! The binary (`tempmap`) is a thin wrapper around this library so the
//! pipeline stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod post;
pub mod report;
