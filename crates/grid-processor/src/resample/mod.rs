//! Resampling a source raster onto the reference grid.

pub mod interpolation;
pub mod reproject;

pub use interpolation::{bilinear_interpolate, cubic_interpolate, nearest_interpolate, sample};
pub use reproject::reproject_match;
