//! Mathematical utilities: DEM profile sampling, scale conversion, statistics.

pub mod gaussian;
pub mod scale;
pub mod stats;

pub use gaussian::*;
pub use scale::*;
pub use stats::*;
