//! The reference (elevation) grid every band is aligned to.

use std::path::{Path, PathBuf};

use raster_common::{Crs, GeoTransform, GridShape, RasterError, RasterResult};
use tracing::info;

use crate::geotiff::read_geotiff;
use crate::types::RasterDataset;

/// Elevation raster defining the target grid. Loaded once, read-only.
#[derive(Debug, Clone)]
pub struct ReferenceGrid {
    path: PathBuf,
    dataset: RasterDataset,
}

impl ReferenceGrid {
    /// Load the reference raster.
    ///
    /// Any failure, including a missing file, is reported as
    /// [`RasterError::FileRead`]: without a reference grid nothing can be
    /// aligned, so the caller is expected to abort the run.
    pub fn load(path: &Path) -> RasterResult<Self> {
        let dataset = read_geotiff(path).map_err(|e| match e {
            RasterError::FileRead { .. } => e,
            RasterError::MissingFile { path } => RasterError::file_read(path, "file not found"),
            other => RasterError::file_read(path, other),
        })?;

        if dataset.shape().is_empty() {
            return Err(RasterError::file_read(path, "reference raster has no pixels"));
        }

        info!(
            path = %path.display(),
            width = dataset.width(),
            height = dataset.height(),
            crs = %dataset.crs(),
            extent = ?dataset.bbox(),
            "Loaded reference grid"
        );

        Ok(Self {
            path: path.to_path_buf(),
            dataset,
        })
    }

    /// Wrap an in-memory dataset as reference grid.
    pub fn from_dataset(path: impl Into<PathBuf>, dataset: RasterDataset) -> Self {
        Self {
            path: path.into(),
            dataset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &RasterDataset {
        &self.dataset
    }

    /// Elevation samples, NaN where the reference has no data.
    pub fn elevation(&self) -> &[f32] {
        self.dataset.data()
    }

    pub fn shape(&self) -> GridShape {
        self.dataset.shape()
    }

    pub fn transform(&self) -> &GeoTransform {
        self.dataset.transform()
    }

    pub fn crs(&self) -> Crs {
        self.dataset.crs()
    }

    /// CRS coordinates of every pixel centre, as two row-major arrays (x, y).
    pub fn coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let shape = self.shape();
        let gt = self.transform();
        let mut xs = Vec::with_capacity(shape.len());
        let mut ys = Vec::with_capacity(shape.len());
        for row in 0..shape.height {
            for col in 0..shape.width {
                let (x, y) = gt.pixel_center(col, row);
                xs.push(x);
                ys.push(y);
            }
        }
        (xs, ys)
    }
}
