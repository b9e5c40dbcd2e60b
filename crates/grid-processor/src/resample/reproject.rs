//! Alignment of a source raster onto a target grid.
//!
//! Every target pixel centre is transformed into the source CRS, then through
//! the inverse of the source geotransform into source pixel space, and sampled
//! there. Target pixels whose centre falls outside the source footprint are
//! set to NaN.

use projection::CoordTransform;
use raster_common::{BoundingBox, RasterError, RasterResult};
use rayon::prelude::*;
use tracing::debug;

use super::interpolation::sample;
use crate::types::{InterpolationMethod, RasterDataset};

/// Resample `source` onto the grid of `target`.
///
/// The result has exactly the shape, transform and CRS of `target`. Fails
/// with [`RasterError::Alignment`] when the two CRSs cannot be related, the
/// source transform is degenerate, or no target pixel falls inside the
/// source footprint.
pub fn reproject_match(
    source: &RasterDataset,
    target: &RasterDataset,
    method: InterpolationMethod,
) -> RasterResult<RasterDataset> {
    let to_source = CoordTransform::new(target.crs(), source.crs())
        .map_err(|e| RasterError::alignment(e.to_string()))?;

    if to_source.is_identity()
        && source.shape() == target.shape()
        && source.transform() == target.transform()
    {
        return Ok(source.clone());
    }

    let src_shape = source.shape();
    if src_shape.is_empty() {
        return Err(RasterError::alignment("source raster is empty"));
    }
    let src_gt = *source.transform();
    if src_gt.invert(src_gt.origin_x, src_gt.origin_y).is_none() {
        return Err(RasterError::alignment("source geotransform is not invertible"));
    }

    if let Some(footprint) = footprint_in(&to_source, target) {
        if !footprint.intersects(&source.bbox()) {
            return Err(no_overlap(source));
        }
    }

    let dst_shape = target.shape();
    let dst_gt = *target.transform();
    let src = source.data();
    let (sw, sh) = (src_shape.width, src_shape.height);

    let mut output = vec![f32::NAN; dst_shape.len()];
    let hits: usize = output
        .par_chunks_mut(dst_shape.width.max(1))
        .enumerate()
        .map(|(row, out_row)| {
            let mut row_hits = 0usize;
            for (col, out) in out_row.iter_mut().enumerate() {
                let (x, y) = dst_gt.pixel_center(col, row);
                let Some((sx, sy)) = to_source.transform(x, y) else {
                    continue;
                };
                let Some((c, r)) = src_gt.invert(sx, sy) else {
                    continue;
                };
                if c < 0.0 || r < 0.0 || c >= sw as f64 || r >= sh as f64 {
                    continue;
                }
                row_hits += 1;
                *out = sample(src, sw, sh, c - 0.5, r - 0.5, method);
            }
            row_hits
        })
        .sum();

    if hits == 0 {
        return Err(no_overlap(source));
    }

    debug!(
        method = %method,
        covered = hits,
        total = dst_shape.len(),
        "Aligned raster to reference grid"
    );

    RasterDataset::new(output, dst_shape, dst_gt, target.crs()).map_err(RasterError::alignment)
}

/// Extent of `target` expressed in the source CRS, traced along its edges.
/// `None` when no edge point can be transformed.
fn footprint_in(to_source: &CoordTransform, target: &RasterDataset) -> Option<BoundingBox> {
    const STEPS: usize = 8;
    let b = target.bbox();
    let edge_points = (0..=STEPS).flat_map(|i| {
        let t = i as f64 / STEPS as f64;
        let x = b.min_x + t * (b.max_x - b.min_x);
        let y = b.min_y + t * (b.max_y - b.min_y);
        [(x, b.min_y), (x, b.max_y), (b.min_x, y), (b.max_x, y)]
    });
    BoundingBox::from_points(edge_points.filter_map(|(x, y)| to_source.transform(x, y)))
}

fn no_overlap(source: &RasterDataset) -> RasterError {
    RasterError::alignment(format!(
        "source extent {:?} ({}) does not overlap the reference grid",
        source.bbox(),
        source.crs()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{Crs, GeoTransform, GridShape};

    fn grid(data: Vec<f32>, w: usize, h: usize, gt: GeoTransform, crs: Crs) -> RasterDataset {
        RasterDataset::new(data, GridShape::new(w, h), gt, crs).unwrap()
    }

    #[test]
    fn test_identical_grid_is_unchanged() {
        let gt = GeoTransform::north_up(23.0, 36.0, 0.5, -0.5);
        let src = grid(vec![1.0, 2.0, 3.0, 4.0], 2, 2, gt, Crs::WGS84);
        let out = reproject_match(&src, &src, InterpolationMethod::Bilinear).unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_upsample_nearest_keeps_reference_shape() {
        let src = grid(
            vec![1.0, 2.0, 3.0, 4.0],
            2,
            2,
            GeoTransform::north_up(0.0, 2.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let target = grid(
            vec![0.0; 16],
            4,
            4,
            GeoTransform::north_up(0.0, 2.0, 0.5, -0.5),
            Crs::WGS84,
        );
        let out = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap();
        assert_eq!(out.shape(), target.shape());
        #[rustfmt::skip]
        let expected = vec![
            1.0, 1.0, 2.0, 2.0,
            1.0, 1.0, 2.0, 2.0,
            3.0, 3.0, 4.0, 4.0,
            3.0, 3.0, 4.0, 4.0,
        ];
        assert_eq!(out.data(), &expected[..]);
    }

    #[test]
    fn test_pixels_outside_source_are_nan() {
        let src = grid(
            vec![5.0; 4],
            2,
            2,
            GeoTransform::north_up(0.0, 2.0, 1.0, -1.0),
            Crs::WGS84,
        );
        // Target extends one source-width further east
        let target = grid(
            vec![0.0; 4],
            4,
            1,
            GeoTransform::north_up(0.0, 2.0, 1.0, -2.0),
            Crs::WGS84,
        );
        let out = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap();
        assert_eq!(out.data()[0], 5.0);
        assert_eq!(out.data()[1], 5.0);
        assert!(out.data()[2].is_nan());
        assert!(out.data()[3].is_nan());
    }

    #[test]
    fn test_disjoint_extent_fails() {
        let src = grid(
            vec![1.0; 4],
            2,
            2,
            GeoTransform::north_up(100.0, 50.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let target = grid(
            vec![0.0; 4],
            2,
            2,
            GeoTransform::north_up(23.0, 36.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let err = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap_err();
        assert!(matches!(err, RasterError::Alignment(_)));
    }

    #[test]
    fn test_disjoint_mercator_extent_fails_before_sampling() {
        use projection::WebMercator;

        // Source over the Canaries, reference over Crete
        let (x0, y1) = WebMercator.forward(-18.0, 29.0).unwrap();
        let src = grid(
            vec![1.0; 4],
            2,
            2,
            GeoTransform::north_up(x0, y1, 50_000.0, -50_000.0),
            Crs::WEB_MERCATOR,
        );
        let target = grid(
            vec![0.0; 4],
            2,
            2,
            GeoTransform::north_up(23.0, 36.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let to_source = CoordTransform::new(target.crs(), src.crs()).unwrap();
        let footprint = footprint_in(&to_source, &target).unwrap();
        assert!(!footprint.intersects(&src.bbox()));

        let err = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap_err();
        assert!(err.to_string().contains("does not overlap"));
    }

    #[test]
    fn test_footprint_covers_target_corners() {
        let target = grid(
            vec![0.0; 4],
            2,
            2,
            GeoTransform::north_up(23.0, 36.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let identity = CoordTransform::new(Crs::WGS84, Crs::WGS84).unwrap();
        let footprint = footprint_in(&identity, &target).unwrap();
        assert_eq!(footprint, BoundingBox::new(23.0, 34.0, 25.0, 36.0));
    }

    #[test]
    fn test_unrelated_crs_fails() {
        let gt = GeoTransform::north_up(0.0, 2.0, 1.0, -1.0);
        let src = grid(vec![1.0; 4], 2, 2, gt, Crs::Unspecified);
        let target = grid(vec![0.0; 4], 2, 2, gt, Crs::WGS84);
        let err = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap_err();
        assert!(matches!(err, RasterError::Alignment(_)));
    }

    #[test]
    fn test_mercator_source_onto_geographic_target() {
        use projection::WebMercator;

        // 2x2 source in Web Mercator covering roughly 24..26E, 34..36N
        let (x0, y1) = WebMercator.forward(24.0, 36.0).unwrap();
        let (x1, y0) = WebMercator.forward(26.0, 34.0).unwrap();
        let src = grid(
            vec![1.0, 2.0, 3.0, 4.0],
            2,
            2,
            GeoTransform::north_up(x0, y1, (x1 - x0) / 2.0, -(y1 - y0) / 2.0),
            Crs::WEB_MERCATOR,
        );
        let target = grid(
            vec![0.0; 4],
            2,
            2,
            GeoTransform::north_up(24.0, 36.0, 1.0, -1.0),
            Crs::WGS84,
        );
        let out = reproject_match(&src, &target, InterpolationMethod::Nearest).unwrap();
        assert_eq!(out.crs(), Crs::WGS84);
        assert_eq!(out.data()[0], 1.0);
        assert_eq!(out.data()[3], 4.0);
    }
}
