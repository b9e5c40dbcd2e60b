//! Core types for loaded rasters.

use raster_common::{BoundingBox, Crs, GeoTransform, GridShape};
use serde::{Deserialize, Serialize};

/// One 2D grid of samples with its georeferencing.
///
/// Samples are row-major, top row first. No-data is stored as NaN once the
/// dataset has been loaded; the value is immutable afterwards.
#[derive(Debug, Clone)]
pub struct RasterDataset {
    data: Vec<f32>,
    shape: GridShape,
    transform: GeoTransform,
    crs: Crs,
}

impl RasterDataset {
    /// Build a dataset, checking that the sample count matches the shape.
    pub fn new(
        data: Vec<f32>,
        shape: GridShape,
        transform: GeoTransform,
        crs: Crs,
    ) -> Result<Self, String> {
        if data.len() != shape.len() {
            return Err(format!(
                "sample count {} does not match {}x{} grid",
                data.len(),
                shape.width,
                shape.height
            ));
        }
        Ok(Self {
            data,
            shape,
            transform,
            crs,
        })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Extent of the grid in its own CRS.
    pub fn bbox(&self) -> BoundingBox {
        self.transform.bbox(self.shape)
    }

    /// Sample at (col, row), `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.shape.width || row >= self.shape.height {
            return None;
        }
        Some(self.data[self.shape.flat_index(col, row)])
    }

    /// Number of non-missing samples.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// True when every sample is no-data.
    pub fn is_all_missing(&self) -> bool {
        !self.data.iter().any(|v| v.is_finite())
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

/// Interpolation method used when aligning a raster to the reference grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest neighbor
    #[default]
    Nearest,
    /// Bilinear interpolation
    Bilinear,
    /// Cubic (Catmull-Rom) interpolation
    Cubic,
}

impl std::str::FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" | "nn" => Ok(InterpolationMethod::Nearest),
            "bilinear" | "linear" => Ok(InterpolationMethod::Bilinear),
            "cubic" | "bicubic" => Ok(InterpolationMethod::Cubic),
            _ => Err(format!("Unknown interpolation method: {}", s)),
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationMethod::Nearest => write!(f, "nearest"),
            InterpolationMethod::Bilinear => write!(f, "bilinear"),
            InterpolationMethod::Cubic => write!(f, "cubic"),
        }
    }
}
