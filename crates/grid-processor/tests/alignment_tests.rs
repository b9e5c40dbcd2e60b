//! Reference grid loading, band alignment and global range accumulation.

use grid_processor::{accumulate_range, BandLoader, InterpolationMethod, ReferenceGrid, YearStatistics};
use raster_common::{Band, RasterError, YearSpan};
use test_utils::{
    create_constant_grid, create_elevation_grid, create_temperature_grid, grid, temp_test_dir,
    write_geotiff_fixture, DatasetDir,
};

fn temperature() -> Band {
    Band::new("temperature_2m", "Temperature_2m", "K", "hot")
}

fn setup() -> (DatasetDir, ReferenceGrid) {
    let dir = DatasetDir::new("Crete", grid::CRETE_COARSE);
    let dem = create_elevation_grid(grid::CRETE.width, grid::CRETE.height, 2400.0);
    let dem_path = dir.write_reference(&grid::CRETE, &dem);
    let reference = ReferenceGrid::load(&dem_path).unwrap();
    (dir, reference)
}

// =============================================================================
// Reference grid
// =============================================================================

#[test]
fn test_reference_grid_loads_elevation() {
    let (_dir, reference) = setup();
    assert_eq!(reference.shape().width, grid::CRETE.width);
    assert_eq!(reference.shape().height, grid::CRETE.height);
    // Sea cells were written as -9999 and come back as no-data
    assert!(reference.elevation()[0].is_nan());
}

#[test]
fn test_unreadable_reference_is_fatal() {
    let dir = temp_test_dir();
    let path = dir.path().join("dem.tif");
    std::fs::write(&path, b"garbage").unwrap();
    let err = ReferenceGrid::load(&path).unwrap_err();
    assert!(matches!(err, RasterError::FileRead { .. }));
    assert!(!err.is_recoverable());
}

// =============================================================================
// Alignment
// =============================================================================

#[test]
fn test_aligned_shape_equals_reference_shape() {
    let (dir, reference) = setup();
    let spec = grid::CRETE_COARSE;
    dir.write_band("Temperature_2m", 1990, &create_temperature_grid(spec.width, spec.height));

    for method in [
        InterpolationMethod::Nearest,
        InterpolationMethod::Bilinear,
        InterpolationMethod::Cubic,
    ] {
        let loader = BandLoader::new(dir.root(), dir.location(), method);
        let aligned = loader.load_aligned(&temperature(), 1990, &reference).unwrap();
        assert_eq!(aligned.shape(), reference.shape(), "method {}", method);
        assert_eq!(aligned.transform(), reference.transform());
        assert_eq!(aligned.valid_count(), reference.shape().len());
    }
}

#[test]
fn test_aligned_constant_field_stays_constant() {
    let (dir, reference) = setup();
    let spec = grid::CRETE_COARSE;
    dir.write_band("Temperature_2m", 1991, &create_constant_grid(spec.width, spec.height, 287.5));

    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Bilinear);
    let aligned = loader.load_aligned(&temperature(), 1991, &reference).unwrap();
    assert!(aligned.data().iter().all(|v| (*v - 287.5).abs() < 1e-4));
}

#[test]
fn test_disjoint_band_is_alignment_error() {
    let (dir, reference) = setup();
    let spec = grid::ANTARCTIC;
    let path = dir.root().join("Crete_Temperature_2m_1995.tif");
    write_geotiff_fixture(&path, &create_constant_grid(spec.width, spec.height, 250.0), &spec, Some(4326), None)
        .unwrap();

    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let err = loader.load_aligned(&temperature(), 1995, &reference).unwrap_err();
    assert!(matches!(err, RasterError::Alignment(_)));
    assert!(err.is_recoverable());
}

#[test]
fn test_missing_year_is_missing_file() {
    let (dir, reference) = setup();
    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let err = loader.load_aligned(&temperature(), 2004, &reference).unwrap_err();
    assert!(matches!(err, RasterError::MissingFile { .. }));
}

#[test]
fn test_load_year_keeps_native_source() {
    let (dir, reference) = setup();
    let spec = grid::CRETE_COARSE;
    let data = create_temperature_grid(spec.width, spec.height);
    dir.write_band("Temperature_2m", 1990, &data);

    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let loaded = loader.load_year(&temperature(), 1990, &reference).unwrap();
    assert_eq!(loaded.source.shape().width, spec.width);
    assert_eq!(loaded.source.data(), &data[..]);
    assert_eq!(loaded.aligned.shape(), reference.shape());

    // 14 columns onto 35 do not divide evenly, so the resampled mean is
    // weighted towards the cells that cover more reference pixels
    let native = YearStatistics::from_samples(1990, loaded.source.data()).unwrap();
    let resampled = YearStatistics::from_samples(1990, loaded.aligned.data()).unwrap();
    assert!((native.mean - resampled.mean).abs() > 1e-3);
}

// =============================================================================
// Global range
// =============================================================================

#[test]
fn test_range_over_present_years_only() {
    let (dir, reference) = setup();
    let spec = grid::CRETE_COARSE;
    let base = create_temperature_grid(spec.width, spec.height);
    for (i, year) in (1990..=1992).enumerate() {
        let data: Vec<f32> = base.iter().map(|v| v + i as f32 * 5.0).collect();
        dir.write_band("Temperature_2m", year, &data);
    }

    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let band = temperature();
    let scan = accumulate_range(&loader, &band, YearSpan::new(1990, 1995).iter(), &reference);

    assert_eq!(scan.contributing, vec![1990, 1991, 1992]);
    assert_eq!(scan.skipped.len(), 3);
    assert!(scan.skipped.iter().all(|(y, _)| *y >= 1993));

    let range = scan.range.unwrap();
    // Every aligned sample of every year lies inside the frozen range
    for year in 1990..=1992 {
        let aligned = loader.load_aligned(&band, year, &reference).unwrap();
        for v in aligned.data().iter().filter(|v| v.is_finite()) {
            assert!(range.contains(*v), "{} outside {:?}", v, range);
        }
    }
    assert!(range.min() >= 250.0);
    assert!(range.max() <= 320.0);
}

#[test]
fn test_all_nodata_year_does_not_contribute() {
    let (dir, reference) = setup();
    let spec = grid::CRETE_COARSE;
    dir.write_band("Temperature_2m", 1990, &create_constant_grid(spec.width, spec.height, 280.0));
    dir.write_band("Temperature_2m", 1991, &vec![f32::NAN; spec.size()]);

    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let scan = accumulate_range(&loader, &temperature(), [1990, 1991], &reference);

    assert_eq!(scan.contributing, vec![1990]);
    let range = scan.range.unwrap();
    assert_eq!(range.min(), 280.0);
    assert_eq!(range.max(), 280.0);
}

#[test]
fn test_band_without_any_data_has_no_range() {
    let (dir, reference) = setup();
    let loader = BandLoader::new(dir.root(), dir.location(), InterpolationMethod::Nearest);
    let band = Band::new("wind_U", "Wind_U", "m/s", "Purples");
    let scan = accumulate_range(&loader, &band, YearSpan::default().iter(), &reference);
    assert!(scan.range.is_none());
    assert!(scan.contributing.is_empty());
    assert_eq!(scan.skipped.len(), 31);
}
