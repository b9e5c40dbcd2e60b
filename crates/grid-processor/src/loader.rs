//! Band raster loader: resolves a (band, year) to a file and aligns it.

use std::path::{Path, PathBuf};

use raster_common::{Band, RasterResult, Year};
use tracing::{debug, instrument};

use crate::geotiff::read_geotiff;
use crate::reference::ReferenceGrid;
use crate::resample::reproject_match;
use crate::types::{InterpolationMethod, RasterDataset};

/// Locates `<input_root>/[<subdir>/]<Location>_<Band>_<Year>.tif` files and
/// aligns them onto the reference grid.
#[derive(Debug, Clone)]
pub struct BandLoader {
    input_root: PathBuf,
    location: String,
    method: InterpolationMethod,
}

impl BandLoader {
    pub fn new(
        input_root: impl Into<PathBuf>,
        location: impl Into<String>,
        method: InterpolationMethod,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            location: location.into(),
            method,
        }
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Path of the source raster for a band and year.
    pub fn source_path(&self, band: &Band, year: Year) -> PathBuf {
        let mut path = self.input_root.clone();
        if let Some(subdir) = &band.subdir {
            path.push(subdir);
        }
        path.push(band.source_file_name(&self.location, year));
        path
    }

    /// Load a band's raster for one year, without alignment.
    pub fn load_raw(&self, band: &Band, year: Year) -> RasterResult<RasterDataset> {
        read_geotiff(&self.source_path(band, year))
    }

    /// Load a band's raster for one year and resample it onto `reference`.
    ///
    /// A missing file yields `MissingFile`; the result always has the
    /// reference grid's shape.
    pub fn load_aligned(
        &self,
        band: &Band,
        year: Year,
        reference: &ReferenceGrid,
    ) -> RasterResult<RasterDataset> {
        self.load_year(band, year, reference).map(|loaded| loaded.aligned)
    }

    /// Like [`load_aligned`](Self::load_aligned), keeping the source raster
    /// at its native resolution alongside the aligned one.
    #[instrument(skip(self, band, reference), fields(band = %band.key))]
    pub fn load_year(
        &self,
        band: &Band,
        year: Year,
        reference: &ReferenceGrid,
    ) -> RasterResult<LoadedYear> {
        let source = self.load_raw(band, year)?;
        debug!(
            path = %self.source_path(band, year).display(),
            width = source.width(),
            height = source.height(),
            "Loaded source raster"
        );
        let aligned = reproject_match(&source, reference.dataset(), self.method)?;
        Ok(LoadedYear { source, aligned })
    }
}

/// One year of a band, as stored and as aligned onto the reference grid.
#[derive(Debug, Clone)]
pub struct LoadedYear {
    pub source: RasterDataset,
    pub aligned: RasterDataset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::RasterError;

    #[test]
    fn test_source_path_layout() {
        let loader = BandLoader::new("/data", "Crete", InterpolationMethod::Nearest);
        let mut band = Band::new("temperature_2m", "Temperature_2m", "K", "hot");
        assert_eq!(
            loader.source_path(&band, 1990),
            PathBuf::from("/data/Crete_Temperature_2m_1990.tif")
        );

        band.subdir = Some("temperature".into());
        assert_eq!(
            loader.source_path(&band, 2020),
            PathBuf::from("/data/temperature/Crete_Temperature_2m_2020.tif")
        );
    }

    #[test]
    fn test_missing_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = BandLoader::new(dir.path(), "Crete", InterpolationMethod::Nearest);
        let band = Band::new("wind_U", "Wind_U", "m/s", "Purples");
        let err = loader.load_raw(&band, 1993).unwrap_err();
        assert!(matches!(err, RasterError::MissingFile { .. }));
        assert!(err.is_recoverable());
    }
}
