//! Phase 1 of the render protocol: the per-band global value range.

use raster_common::{Band, GlobalRange, RangeAccumulator, Year};
use tracing::{debug, info, warn};

use crate::loader::BandLoader;
use crate::reference::ReferenceGrid;

/// Outcome of a range scan over a band's years.
#[derive(Debug, Clone)]
pub struct RangeScan {
    /// Frozen range, `None` when no year had a valid sample
    pub range: Option<GlobalRange>,
    /// Years that contributed samples
    pub contributing: Vec<Year>,
    /// Years skipped, with the reason
    pub skipped: Vec<(Year, String)>,
}

/// Fold every year's aligned samples into one range for `band`.
///
/// Missing files and failed loads are logged and skipped, as are arrays with
/// no valid sample. Only the frozen [`GlobalRange`] leaves this function.
pub fn accumulate_range(
    loader: &BandLoader,
    band: &Band,
    years: impl IntoIterator<Item = Year>,
    reference: &ReferenceGrid,
) -> RangeScan {
    let mut acc = RangeAccumulator::new();
    let mut contributing = Vec::new();
    let mut skipped = Vec::new();

    for year in years {
        match loader.load_aligned(band, year, reference) {
            Ok(dataset) => {
                let valid = acc.fold(dataset.data());
                if valid == 0 {
                    debug!(band = %band.key, year, "No valid samples, not part of range");
                    skipped.push((year, "no valid samples".to_string()));
                } else {
                    contributing.push(year);
                }
            }
            Err(e) => {
                warn!(band = %band.key, year, error = %e, "Skipping year in range scan");
                skipped.push((year, e.to_string()));
            }
        }
    }

    let samples = acc.valid_samples();
    let range = acc.finish();
    match range {
        Some(r) => info!(
            band = %band.key,
            min = r.min(),
            max = r.max(),
            years = contributing.len(),
            samples,
            "Global range"
        ),
        None => warn!(band = %band.key, "No valid data in any year, band cannot be rendered"),
    }

    RangeScan {
        range,
        contributing,
        skipped,
    }
}
