//! Yearly summary statistics and the normalised mean series.

use raster_common::Year;
use serde::{Deserialize, Serialize};

/// Summary of one (band, year) array over its valid samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearStatistics {
    pub year: Year,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub valid_count: usize,
}

impl YearStatistics {
    /// Compute statistics over the finite samples of `data`.
    ///
    /// Returns `None` when there are none.
    pub fn from_samples(year: Year, data: &[f32]) -> Option<Self> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut count = 0usize;

        for &v in data.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            count += 1;
        }

        if count == 0 {
            return None;
        }
        Some(Self {
            year,
            min,
            max,
            mean: sum / count as f64,
            valid_count: count,
        })
    }
}

/// One row of the normalised series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: Year,
    pub mean: Option<f64>,
    pub normalized: Option<f64>,
}

/// Min-max normalise yearly means across the years that have one.
///
/// Years without a mean keep an empty value. When all means are equal, every
/// normalised value is 0.
pub fn normalize_series(means: &[(Year, Option<f64>)]) -> Vec<SeriesPoint> {
    let present = means.iter().filter_map(|(_, m)| *m);
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
        (lo.min(m), hi.max(m))
    });
    let span = hi - lo;

    means
        .iter()
        .map(|&(year, mean)| SeriesPoint {
            year,
            mean,
            normalized: mean.map(|m| if span > 0.0 { (m - lo) / span } else { 0.0 }),
        })
        .collect()
}
