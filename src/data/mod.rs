//! Observation data.
//!
//! - the normalized image stack the fitter consumes (`stack`)
//! - synthetic scenes with known temperatures (`synthetic`)

pub mod stack;
pub mod synthetic;

pub use stack::*;
pub use synthetic::*;
