//! Interpolation methods for grid resampling.
//!
//! Positions are in sample space: `(0.0, 0.0)` is the centre of the first
//! pixel and `(width - 1, height - 1)` the centre of the last. Callers keep
//! positions within half a pixel of the grid; the kernels clamp to the edge.

use crate::types::InterpolationMethod;

/// Sample `data` at a sample-space position with the given method.
pub fn sample(
    data: &[f32],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
    method: InterpolationMethod,
) -> f32 {
    match method {
        InterpolationMethod::Nearest => nearest_interpolate(data, width, height, x, y),
        InterpolationMethod::Bilinear => bilinear_interpolate(data, width, height, x, y),
        InterpolationMethod::Cubic => cubic_interpolate(data, width, height, x, y),
    }
}

fn clamp_index(v: f64, len: usize) -> usize {
    if v <= 0.0 {
        0
    } else {
        (v as usize).min(len - 1)
    }
}

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return f32::NAN;
    }
    let col = clamp_index(x.round(), width);
    let row = clamp_index(y.round(), height);
    data[row * width + col]
}

/// Bilinear interpolation.
///
/// Missing corners are dropped and the remaining weights renormalised, so a
/// valid pixel next to a no-data pixel still yields a value. NaN only when
/// every contributing corner is missing.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let corners = [
        (data[y0 * width + x0], (1.0 - xf) * (1.0 - yf)),
        (data[y0 * width + x1], xf * (1.0 - yf)),
        (data[y1 * width + x0], (1.0 - xf) * yf),
        (data[y1 * width + x1], xf * yf),
    ];

    let mut sum = 0.0f64;
    let mut weight = 0.0f64;
    for (v, w) in corners {
        if v.is_finite() && w > 0.0 {
            sum += v as f64 * w;
            weight += w;
        }
    }

    if weight <= 0.0 {
        return f32::NAN;
    }
    (sum / weight) as f32
}

/// Bicubic interpolation.
///
/// Uses 16 surrounding points for smoother interpolation. Falls back to
/// bilinear when any of them is missing.
pub fn cubic_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return f32::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;

    let xf = (x - xi as f64) as f32;
    let yf = (y - yi as f64) as f32;

    // Sample 4x4 grid of points
    let mut values = [[0.0f32; 4]; 4];

    for j in 0..4 {
        for i in 0..4 {
            let px = (xi + i as i64 - 1).clamp(0, width as i64 - 1) as usize;
            let py = (yi + j as i64 - 1).clamp(0, height as i64 - 1) as usize;
            let v = data[py * width + px];

            if !v.is_finite() {
                return bilinear_interpolate(data, width, height, x, y);
            }
            values[j][i] = v;
        }
    }

    // Cubic interpolation along x for each row
    let mut row_values = [0.0f32; 4];
    for j in 0..4 {
        row_values[j] = cubic_1d(values[j][0], values[j][1], values[j][2], values[j][3], xf);
    }

    // Cubic interpolation along y
    cubic_1d(row_values[0], row_values[1], row_values[2], row_values[3], yf)
}

/// 1D cubic interpolation using Catmull-Rom spline.
fn cubic_1d(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    // Catmull-Rom coefficients
    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}
