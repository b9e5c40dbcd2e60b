//! Common types and utilities shared across the climate-viz crates.

pub mod band;
pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod range;

pub use band::{Band, Year, YearSpan, FIRST_YEAR, LAST_YEAR};
pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{RasterError, RasterResult};
pub use grid::{GeoTransform, GridShape};
pub use range::{GlobalRange, RangeAccumulator};
