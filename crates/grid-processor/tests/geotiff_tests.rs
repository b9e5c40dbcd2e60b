//! GeoTIFF reader and writer tests against files on disk.

use grid_processor::{read_geotiff, write_geotiff, RasterDataset};
use raster_common::{Crs, GeoTransform, GridShape, RasterError};
use test_utils::{
    create_grid_with_nans, create_temperature_grid, grid, temp_test_dir, write_geotiff_fixture,
    write_geotiff_with_transform,
};

// =============================================================================
// Reading
// =============================================================================

#[test]
fn test_read_fixture_georeferencing() {
    let dir = temp_test_dir();
    let path = dir.path().join("Crete_Temperature_2m_1990.tif");
    let spec = grid::CRETE;
    let data = create_temperature_grid(spec.width, spec.height);
    write_geotiff_fixture(&path, &data, &spec, Some(4326), None).unwrap();

    let ds = read_geotiff(&path).unwrap();
    assert_eq!(ds.shape(), GridShape::new(spec.width, spec.height));
    assert_eq!(ds.crs(), Crs::WGS84);
    assert_eq!(ds.data(), &data[..]);

    let gt = ds.transform();
    assert!((gt.origin_x - 23.3).abs() < 1e-9);
    assert!((gt.origin_y - 35.8).abs() < 1e-9);
    assert!((gt.pixel_width - 0.1).abs() < 1e-9);
    assert!((gt.pixel_height + 0.1).abs() < 1e-9);
}

#[test]
fn test_nodata_sentinel_becomes_nan() {
    let dir = temp_test_dir();
    let path = dir.path().join("holes.tif");
    let spec = grid::SIMPLE_10X10;
    let data = create_grid_with_nans(spec.width, spec.height, &[(0, 0), (5, 5)]);
    write_geotiff_fixture(&path, &data, &spec, Some(4326), Some(-9999.0)).unwrap();

    let ds = read_geotiff(&path).unwrap();
    assert!(ds.data()[0].is_nan());
    assert!(ds.data()[55].is_nan());
    assert_eq!(ds.data()[1], 0.0);
    assert_eq!(ds.valid_count(), 98);
}

#[test]
fn test_missing_geokeys_is_unspecified_crs() {
    let dir = temp_test_dir();
    let path = dir.path().join("nocrs.tif");
    let spec = grid::SIMPLE_10X10;
    write_geotiff_fixture(&path, &vec![1.0; spec.size()], &spec, None, None).unwrap();

    let ds = read_geotiff(&path).unwrap();
    assert_eq!(ds.crs(), Crs::Unspecified);
}

#[test]
fn test_projected_crs_is_read() {
    let dir = temp_test_dir();
    let path = dir.path().join("mercator.tif");
    let gt = GeoTransform::north_up(2_600_000.0, 4_270_000.0, 10_000.0, -10_000.0);
    write_geotiff_with_transform(&path, &[1.0; 6], 3, 2, &gt, Some(3857), None).unwrap();

    let ds = read_geotiff(&path).unwrap();
    assert_eq!(ds.crs(), Crs::WEB_MERCATOR);
    assert_eq!(*ds.transform(), gt);
}

#[test]
fn test_missing_file() {
    let dir = temp_test_dir();
    let err = read_geotiff(&dir.path().join("Crete_Wind_U_1993.tif")).unwrap_err();
    assert!(matches!(err, RasterError::MissingFile { .. }));
}

#[test]
fn test_garbage_file_is_decode_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("broken.tif");
    std::fs::write(&path, b"definitely not a tiff").unwrap();
    let err = read_geotiff(&path).unwrap_err();
    assert!(matches!(err, RasterError::Decode { .. }));
}

// =============================================================================
// Writing
// =============================================================================

#[test]
fn test_write_then_read_keeps_nodata_and_geometry() {
    let dir = temp_test_dir();
    let path = dir.path().join("out.tif");
    let gt = GeoTransform::north_up(23.3, 35.8, 0.25, -0.25);
    let ds = RasterDataset::new(
        vec![1.0, f32::NAN, 3.0, 4.0, 5.0, f32::NAN],
        GridShape::new(3, 2),
        gt,
        Crs::WGS84,
    )
    .unwrap();

    write_geotiff(&path, &ds, Some(-9999.0)).unwrap();
    let back = read_geotiff(&path).unwrap();

    assert_eq!(back.shape(), ds.shape());
    assert_eq!(back.crs(), Crs::WGS84);
    assert_eq!(*back.transform(), gt);
    assert!(back.data()[1].is_nan());
    assert!(back.data()[5].is_nan());
    assert_eq!(back.data()[4], 5.0);
}

#[test]
fn test_write_rotated_transform() {
    let dir = temp_test_dir();
    let path = dir.path().join("rotated.tif");
    let gt = GeoTransform::from_gdal([100.0, 2.0, 0.5, 50.0, 0.25, -3.0]);
    let ds = RasterDataset::new(vec![1.0; 4], GridShape::new(2, 2), gt, Crs::WEB_MERCATOR).unwrap();

    write_geotiff(&path, &ds, None).unwrap();
    let back = read_geotiff(&path).unwrap();
    assert_eq!(*back.transform(), gt);
}

#[test]
fn test_write_into_missing_directory_fails() {
    let dir = temp_test_dir();
    let path = dir.path().join("no/such/dir/out.tif");
    let ds = RasterDataset::new(
        vec![1.0],
        GridShape::new(1, 1),
        GeoTransform::north_up(0.0, 0.0, 1.0, -1.0),
        Crs::WGS84,
    )
    .unwrap();
    let err = write_geotiff(&path, &ds, None).unwrap_err();
    assert!(matches!(err, RasterError::Write { .. }));
}
