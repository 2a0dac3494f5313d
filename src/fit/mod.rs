//! Temperature inversion.
//!
//! Responsibilities:
//!
//! - generate the candidate temperature axis
//! - match every pixel's channel vector against the synthetic table (parallel)
//! - report the winning temperature and its residual

pub mod axis;
pub mod fitter;

pub use axis::*;
pub use fitter::*;
