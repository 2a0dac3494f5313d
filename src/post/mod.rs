//! Post-processing of fitted fields.
//!
//! - `limb`: geometric off-limb mask
//! - `emission`: emission measure / column density from the temperature map

pub mod emission;
pub mod limb;

pub use emission::*;
pub use limb::*;
