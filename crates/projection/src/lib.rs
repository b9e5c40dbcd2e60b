//! Coordinate reference system transformations.
//!
//! Implements the projections the study rasters come in from scratch:
//! geographic WGS84 and spherical Web Mercator.

pub mod mercator;
pub mod transform;

pub use mercator::WebMercator;
pub use transform::{CoordTransform, Projection, ProjectionError};
