//! The synthetic emission model.
//!
//! - `response`: instrument response curves on a shared log-T grid
//! - `dem`: the assumed DEM shape
//! - `synth`: the lookup table and how it is built
//! - `builder`: cache-aware build-or-load entry point

pub mod builder;
pub mod dem;
pub mod response;
pub mod synth;

pub use builder::*;
pub use dem::*;
pub use response::*;
pub use synth::*;
