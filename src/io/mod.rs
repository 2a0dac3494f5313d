//! Input/output helpers.
//!
//! - response-table ingest (`response`)
//! - binary synthetic-model cache (`cache`)
//! - CSV image grids (`image`)
//! - map exports (CSV/JSON) (`export`)

pub mod cache;
pub mod export;
pub mod image;
pub mod response;

pub use cache::*;
pub use export::*;
pub use image::*;
pub use response::*;
