//! Normalised yearly means written as CSV.

use csv::Writer;
use grid_processor::SeriesPoint;
use raster_common::{RasterError, RasterResult};
use std::path::Path;

/// Write `year,mean,normalized` rows; missing values are empty fields.
pub fn write_series_csv(path: &Path, series: &[SeriesPoint]) -> RasterResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RasterError::write(parent, e))?;
    }
    let mut writer = Writer::from_path(path).map_err(|e| RasterError::write(path, e))?;
    for point in series {
        writer
            .serialize(point)
            .map_err(|e| RasterError::write(path, e))?;
    }
    writer.flush().map_err(|e| RasterError::write(path, e))
}
