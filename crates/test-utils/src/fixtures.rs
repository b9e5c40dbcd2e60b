//! Common test fixtures: grid specs and GeoTIFF files on disk.
//!
//! GeoTIFFs are written here with the `tiff` crate directly, independent of
//! the reader under test, using the same tags a GDAL export would carry.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use raster_common::GeoTransform;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Common grid specifications for testing.
pub mod grid {
    use raster_common::GeoTransform;

    /// Crete at roughly 0.1 degree resolution
    pub const CRETE: GridSpec = GridSpec {
        width: 35,
        height: 10,
        min_lon: 23.3,
        max_lon: 26.8,
        min_lat: 34.8,
        max_lat: 35.8,
    };

    /// Coarser grid over the same area, as the climate reanalysis files come
    pub const CRETE_COARSE: GridSpec = GridSpec {
        width: 14,
        height: 4,
        min_lon: 23.3,
        max_lon: 26.8,
        min_lat: 34.8,
        max_lat: 35.8,
    };

    /// Simple 10x10 test grid
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_lon: -10.0,
        max_lon: 10.0,
        min_lat: -10.0,
        max_lat: 10.0,
    };

    /// Far away from Crete, for disjoint-extent tests
    pub const ANTARCTIC: GridSpec = GridSpec {
        width: 8,
        height: 8,
        min_lon: 100.0,
        max_lon: 108.0,
        min_lat: -80.0,
        max_lat: -72.0,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the resolution in degrees.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / self.width as f64;
            let dy = (self.max_lat - self.min_lat) / self.height as f64;
            (dx, dy)
        }

        /// North-up geotransform with the origin at the top-left corner.
        pub fn geotransform(&self) -> GeoTransform {
            let (dx, dy) = self.resolution();
            GeoTransform::north_up(self.min_lon, self.max_lat, dx, -dy)
        }
    }
}

use grid::GridSpec;

/// Write a single-band float GeoTIFF.
///
/// `epsg` of `None` leaves the CRS unspecified. NaN samples are replaced by
/// `nodata` when given.
pub fn write_geotiff_fixture(
    path: &Path,
    data: &[f32],
    spec: &GridSpec,
    epsg: Option<u16>,
    nodata: Option<f32>,
) -> Result<(), tiff::TiffError> {
    write_geotiff_with_transform(path, data, spec.width, spec.height, &spec.geotransform(), epsg, nodata)
}

/// Write a single-band float GeoTIFF with an explicit geotransform.
pub fn write_geotiff_with_transform(
    path: &Path,
    data: &[f32],
    width: usize,
    height: usize,
    gt: &GeoTransform,
    epsg: Option<u16>,
    nodata: Option<f32>,
) -> Result<(), tiff::TiffError> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(width as u32, height as u32)?;

    let dir = image.encoder();
    dir.write_tag(Tag::ModelPixelScaleTag, &[gt.pixel_width, -gt.pixel_height, 0.0][..])?;
    dir.write_tag(
        Tag::ModelTiepointTag,
        &[0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0][..],
    )?;

    let mut keys: Vec<u16> = vec![1, 1, 0, 1, 1025, 0, 1, 1];
    if let Some(code) = epsg {
        let geographic = matches!(code, 4326 | 4269 | 4258);
        let (model, key) = if geographic { (2, 2048) } else { (1, 3072) };
        keys.extend_from_slice(&[1024, 0, 1, model, key, 0, 1, code]);
        keys[3] = 3;
    }
    dir.write_tag(Tag::GeoKeyDirectoryTag, &keys[..])?;

    let samples: Vec<f32> = match nodata {
        Some(nd) => {
            dir.write_tag(Tag::GdalNodata, nd.to_string().as_str())?;
            data.iter().map(|v| if v.is_nan() { nd } else { *v }).collect()
        }
        None => data.to_vec(),
    };

    image.write_data(&samples)
}

/// Scratch input directory laid out like the real dataset:
/// `<root>/<Location>_<Band>_<Year>.tif` plus a reference DEM.
pub struct DatasetDir {
    dir: tempfile::TempDir,
    location: String,
    spec: GridSpec,
}

impl DatasetDir {
    /// New empty directory; band files are written on the given grid.
    pub fn new(location: &str, spec: GridSpec) -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create dataset directory"),
            location: location.to_string(),
            spec,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Write the reference DEM (EPSG:4326, no-data -9999) and return its path.
    pub fn write_reference(&self, spec: &GridSpec, elevation: &[f32]) -> PathBuf {
        let path = self.dir.path().join("dem.tif");
        write_geotiff_fixture(&path, elevation, spec, Some(4326), Some(-9999.0))
            .expect("Failed to write reference fixture");
        path
    }

    /// Write one band raster for a year and return its path.
    pub fn write_band(&self, display_name: &str, year: i32, data: &[f32]) -> PathBuf {
        let path = self
            .dir
            .path()
            .join(format!("{}_{}_{}.tif", self.location, display_name, year));
        write_geotiff_fixture(&path, data, &self.spec, Some(4326), Some(-9999.0))
            .expect("Failed to write band fixture");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crete_geotransform() {
        let gt = grid::CRETE.geotransform();
        assert!((gt.origin_x - 23.3).abs() < 1e-9);
        assert!((gt.origin_y - 35.8).abs() < 1e-9);
        assert!((gt.pixel_width - 0.1).abs() < 1e-9);
        assert!((gt.pixel_height + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_dataset_dir_naming() {
        let dir = DatasetDir::new("Crete", grid::CRETE_COARSE);
        let data = vec![280.0; grid::CRETE_COARSE.size()];
        let path = dir.write_band("Temperature_2m", 1990, &data);
        assert!(path.ends_with("Crete_Temperature_2m_1990.tif"));
        assert!(path.exists());
    }
}
