//! Tests for colour mapping against a band's global range.

use raster_common::{GlobalRange, RangeAccumulator};
use renderer::colormap::Colormap;
use renderer::gradient::colorize;
use test_utils::{create_grid_with_nans, create_precipitation_grid, create_temperature_grid};

// ============================================================================
// Alpha invariants
// ============================================================================

#[test]
fn test_alpha_follows_nodata_mask() {
    let nans = [(0, 0), (3, 1), (7, 4), (2, 2)];
    let mut data = create_grid_with_nans(8, 5, &nans);
    for (i, v) in data.iter_mut().enumerate() {
        if !v.is_nan() {
            *v = 270.0 + i as f32;
        }
    }
    let range = GlobalRange::new(270.0, 310.0).unwrap();
    let raster = colorize(&data, 8, 5, range, &Colormap::builtin("hot").unwrap());

    for row in 0..5 {
        for col in 0..8 {
            let px = raster.pixel(col, row);
            if nans.contains(&(col, row)) {
                assert_eq!(px, [0, 0, 0, 0], "no-data at ({}, {})", col, row);
            } else {
                assert_eq!(px[3], 255, "valid sample at ({}, {})", col, row);
            }
        }
    }
}

#[test]
fn test_all_nodata_is_fully_transparent() {
    let data = vec![f32::NAN; 12];
    let range = GlobalRange::new(0.0, 1.0).unwrap();
    let raster = colorize(&data, 4, 3, range, &Colormap::builtin("Greens").unwrap());
    assert!(raster.pixels().iter().all(|&b| b == 0));
}

// ============================================================================
// Idempotence and range sharing
// ============================================================================

#[test]
fn test_colorize_is_idempotent() {
    let data = create_temperature_grid(50, 30);
    let range = GlobalRange::new(250.0, 310.0).unwrap();
    let map = Colormap::builtin("coolwarm").unwrap();

    let first = colorize(&data, 50, 30, range, &map);
    for _ in 0..3 {
        assert_eq!(colorize(&data, 50, 30, range, &map), first);
    }
}

#[test]
fn test_years_share_one_colour_scale() {
    // Two years folded into one range: equal values get equal colours
    // regardless of which year they came from.
    let y1990 = vec![270.0, 280.0, 290.0, f32::NAN];
    let y1991 = vec![280.0, 300.0, 310.0, 275.0];

    let mut acc = RangeAccumulator::new();
    acc.fold(&y1990);
    acc.fold(&y1991);
    let range = acc.finish().unwrap();
    assert_eq!((range.min(), range.max()), (270.0, 310.0));

    let map = Colormap::builtin("hot").unwrap();
    let a = colorize(&y1990, 4, 1, range, &map);
    let b = colorize(&y1991, 4, 1, range, &map);
    assert_eq!(a.pixel(1, 0), b.pixel(0, 0));
    assert_eq!(b.pixel(2, 0), map.sample(1.0).to_array());
    assert_eq!(a.pixel(0, 0), map.sample(0.0).to_array());
}

#[test]
fn test_reversed_colormap_flips_ends() {
    let data = create_precipitation_grid(16, 16, 7);
    let range = GlobalRange::new(0.0, 50.0).unwrap();
    let map = Colormap::builtin("Blues").unwrap();
    let rev = Colormap::builtin("Blues_r").unwrap();

    let fwd = colorize(&[0.0, 50.0], 2, 1, range, &map);
    let back = colorize(&[50.0, 0.0], 2, 1, range, &rev);
    assert_eq!(fwd, back);

    // Precipitation grid is mostly zero: those cells take the low end
    let raster = colorize(&data, 16, 16, range, &map);
    let low = map.sample(0.0).to_array();
    let zeros = data.iter().filter(|v| **v == 0.0).count();
    let low_pixels = (0..16)
        .flat_map(|y| (0..16).map(move |x| (x, y)))
        .filter(|&(x, y)| raster.pixel(x, y) == low)
        .count();
    assert!(low_pixels >= zeros);
}

#[test]
fn test_custom_hex_colormap() {
    let stops = vec!["#000000".to_string(), "#ffffff".to_string()];
    let map = Colormap::from_hex("gray", &stops).unwrap();
    let range = GlobalRange::new(0.0, 1.0).unwrap();
    let raster = colorize(&[0.0, 1.0], 2, 1, range, &map);
    assert_eq!(raster.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(raster.pixel(1, 0), [255, 255, 255, 255]);
}
