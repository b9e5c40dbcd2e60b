//! Raster grid geometry: shape and affine geotransform.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Dimensions of a row-major raster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl GridShape {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row-major index of (col, row).
    pub fn flat_index(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }
}

/// Affine transform from pixel space to CRS coordinates, in GDAL order.
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `(col, row) = (0, 0)` is the outer top-left corner of the first pixel;
/// pixel centres sit at half-integer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    /// Usually negative (rows run north to south)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Build from the six GDAL coefficients.
    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map continuous pixel coordinates to CRS coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// CRS coordinates of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map CRS coordinates back to continuous pixel coordinates.
    ///
    /// Returns `None` when the transform is degenerate.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < f64::EPSILON * 1e-3 || !det.is_finite() {
            return None;
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        Some((col, row))
    }

    /// Extent covered by a grid of the given shape.
    pub fn bbox(&self, shape: GridShape) -> BoundingBox {
        let (w, h) = (shape.width as f64, shape.height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        BoundingBox::from_points(corners)
            .unwrap_or_else(|| BoundingBox::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN))
    }
}
