//! Raster loading and alignment for yearly climate datasets.
//!
//! This crate turns GeoTIFF files on disk into grids that all share one
//! reference geometry:
//!
//! - **GeoTIFF I/O**: band 1 of a file, its affine transform, CRS and no-data
//!   sentinel (converted to NaN on load)
//! - **Reference grid**: the elevation raster every band is resampled onto
//! - **Band loader**: resolves `<Location>_<Band>_<Year>.tif` and aligns it
//! - **Range accumulation**: phase 1 of the render protocol
//!
//! # Architecture
//!
//! ```text
//! ReferenceGrid::load(dem.tif)            (once, fatal on failure)
//!      │
//!      ▼
//! BandLoader::load_year(band, year)       (per item, recoverable)
//!      │
//!      ├─► read_geotiff(<Location>_<Band>_<Year>.tif)
//!      │        │
//!      │        └─► YearStatistics (native resolution)
//!      │
//!      └─► reproject_match(source, reference)
//!               │
//!               ▼
//!          RasterDataset (reference shape)
//!               │
//!               ├─► accumulate_range → GlobalRange   (phase 1)
//!               └─► renderer                         (phase 2)
//! ```

pub mod geotiff;
pub mod loader;
pub mod range;
pub mod reference;
pub mod resample;
pub mod stats;
pub mod types;

pub use geotiff::{read_geotiff, write_geotiff};
pub use loader::{BandLoader, LoadedYear};
pub use range::{accumulate_range, RangeScan};
pub use reference::ReferenceGrid;
pub use resample::reproject_match;
pub use stats::{normalize_series, SeriesPoint, YearStatistics};
pub use types::{InterpolationMethod, RasterDataset};
