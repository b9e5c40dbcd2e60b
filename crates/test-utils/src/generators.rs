//! Deterministic synthetic rasters for band and reference fixtures.

/// 2 m temperature in Kelvin, a diagonal ramp from 250 K (north-west) to
/// 310 K (south-east), so every year of a fixture has a known range.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            let temp = 250.0 + (x_factor * 30.0) + (y_factor * 30.0);
            data.push(temp);
        }
    }
    data
}

/// Monthly-total-like precipitation in mm: three dry cells in four, the rest
/// between 0 and 50 mm. The same `seed` always gives the same field.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f32 / 100.0
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates an island-shaped elevation grid in metres.
///
/// A smooth dome peaking at `peak` in the centre and falling to sea level at
/// the edge of an inscribed ellipse. Cells outside the ellipse are sea and
/// come back as NaN, like the no-data area of a coastal DEM.
pub fn create_elevation_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    for row in 0..height {
        for col in 0..width {
            let dx = (col as f32 - cx) / (cx + 0.5).max(0.5);
            let dy = (row as f32 - cy) / (cy + 0.5).max(0.5);
            let r2 = dx * dx + dy * dy;
            if r2 >= 1.0 {
                data.push(f32::NAN);
            } else {
                data.push(peak * (1.0 - r2));
            }
        }
    }
    data
}

pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Zeros with no-data (NaN) at the given `(col, row)` cells. Out-of-grid
/// positions are ignored.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Opaque RGBA pixels drawn from a 20-step blue to red ramp, small enough
/// for an indexed PNG.
pub fn create_palette_pixels(width: usize, height: usize) -> Vec<u8> {
    const STEPS: usize = 20;
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let t = x as f32 / width.max(1) as f32 * 0.3 + y as f32 / height.max(1) as f32 * 0.7;
            let step = ((t * (STEPS - 1) as f32) as usize).min(STEPS - 1);
            let red = (step * 255 / (STEPS - 1)) as u8;
            pixels.extend_from_slice(&[red, 64, 255 - red, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temperature_grid() {
        let grid = create_temperature_grid(100, 100);
        assert_eq!(grid.len(), 10000);
        // Check temperature range
        let min = grid.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = grid.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(min >= 250.0);
        assert!(max <= 310.0);
    }

    #[test]
    fn test_create_elevation_grid() {
        let grid = create_elevation_grid(21, 11, 2400.0);
        assert_eq!(grid.len(), 231);
        // Sea at the corners, summit in the middle
        assert!(grid[0].is_nan());
        assert!(grid[230].is_nan());
        let summit = grid[5 * 21 + 10];
        assert!((summit - 2400.0).abs() < 1e-3);
    }

    #[test]
    fn test_create_constant_grid() {
        let grid = create_constant_grid(10, 10, 42.0);
        assert_eq!(grid.len(), 100);
        assert!(grid.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan()); // (0, 0)
        assert!(grid[55].is_nan()); // (5, 5) = row 5 * 10 + col 5
        assert!(!grid[1].is_nan()); // (1, 0) should be 0.0
    }

    #[test]
    fn test_create_palette_pixels() {
        let pixels = create_palette_pixels(256, 256);
        assert_eq!(pixels.len(), 256 * 256 * 4);
        assert!(pixels.chunks_exact(4).all(|p| p[3] == 255));
        let distinct: std::collections::HashSet<&[u8]> = pixels.chunks_exact(4).collect();
        assert!(distinct.len() <= 20);
    }

    #[test]
    fn test_precipitation_deterministic() {
        let grid1 = create_precipitation_grid(100, 100, 42);
        let grid2 = create_precipitation_grid(100, 100, 42);
        assert_eq!(grid1, grid2, "Same seed should produce same data");

        let grid3 = create_precipitation_grid(100, 100, 43);
        assert_ne!(grid1, grid3, "Different seed should produce different data");
    }
}
