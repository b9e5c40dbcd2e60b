//! Per-band value ranges.
//!
//! Rendering is a two-phase protocol. Phase 1 folds every year's valid
//! samples into a [`RangeAccumulator`]; [`RangeAccumulator::finish`] then
//! freezes the result into a [`GlobalRange`], which is `Copy` and has no
//! mutating methods. Phase 2 only ever sees the frozen value, so every
//! artifact of a band shares one colour scale.

use serde::{Deserialize, Serialize};

/// Frozen (min, max) of a band's valid samples across all years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalRange {
    min: f32,
    max: f32,
}

impl GlobalRange {
    /// Build a range from explicit bounds. Returns `None` for non-finite or
    /// inverted bounds.
    pub fn new(min: f32, max: f32) -> Option<Self> {
        if min.is_finite() && max.is_finite() && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Whether `value` lies inside the range (inclusive).
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Linear normalisation into [0, 1], clamping out-of-range values.
    ///
    /// A degenerate range (min == max) maps every value to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Value at normalised position `t` in [0, 1].
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + self.span() * t
    }
}

/// Running (min, max) fold over valid samples. Phase 1 only.
#[derive(Debug, Clone)]
pub struct RangeAccumulator {
    min: f32,
    max: f32,
    valid_samples: usize,
    arrays: usize,
}

impl RangeAccumulator {
    /// Start with the (+inf, -inf) sentinel.
    pub fn new() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            valid_samples: 0,
            arrays: 0,
        }
    }

    /// Fold one array in. NaN samples are no-data and ignored; an array with no
    /// valid samples leaves the accumulator untouched.
    ///
    /// Returns the number of valid samples seen in `data`.
    pub fn fold(&mut self, data: &[f32]) -> usize {
        let mut valid = 0usize;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in data {
            if v.is_finite() {
                valid += 1;
                min = min.min(v);
                max = max.max(v);
            }
        }
        if valid > 0 {
            self.min = self.min.min(min);
            self.max = self.max.max(max);
            self.valid_samples += valid;
            self.arrays += 1;
        }
        valid
    }

    /// Number of arrays that contributed at least one sample.
    pub fn contributing_arrays(&self) -> usize {
        self.arrays
    }

    pub fn valid_samples(&self) -> usize {
        self.valid_samples
    }

    /// Freeze the fold. `None` means no valid sample was seen: the band
    /// cannot be rendered.
    pub fn finish(self) -> Option<GlobalRange> {
        if self.valid_samples == 0 {
            return None;
        }
        GlobalRange::new(self.min, self.max)
    }
}

impl Default for RangeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
