//! Band definitions and the year axis used to name input files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First year of the study period.
pub const FIRST_YEAR: Year = 1990;
/// Last year of the study period (inclusive).
pub const LAST_YEAR: Year = 2020;

/// Calendar year. Used only as a file naming key.
pub type Year = i32;

/// One physical quantity tracked across years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Short key used for output directories and CLI filters (e.g. `temperature_2m`)
    pub key: String,
    /// Name as it appears in input and overlay file names (e.g. `Temperature_2m`)
    pub display_name: String,
    /// Unit label shown on colour bars (e.g. `K`)
    pub unit: String,
    /// Colour map identifier (e.g. `hot`, `Blues`)
    pub colormap: String,
    /// Optional sub-directory of the input root holding this band's files
    #[serde(default)]
    pub subdir: Option<String>,
    /// Fixed legend range for the standalone colour bar, overriding the global range
    #[serde(default)]
    pub legend_range: Option<[f32; 2]>,
}

impl Band {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        unit: impl Into<String>,
        colormap: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            unit: unit.into(),
            colormap: colormap.into(),
            subdir: None,
            legend_range: None,
        }
    }

    /// Source raster file name: `<Location>_<BandDisplayName>_<Year>.tif`
    pub fn source_file_name(&self, location: &str, year: Year) -> String {
        format!("{}_{}_{}.tif", location, self.display_name, year)
    }

    /// Overlay image name served to the web map: `<Location>_<BandDisplayName>_<Year>.png`
    pub fn overlay_file_name(&self, location: &str, year: Year) -> String {
        format!("{}_{}_{}.png", location, self.display_name, year)
    }

    /// Legend image name served to the web map: `colorbar_<BandDisplayName>.png`
    pub fn colorbar_file_name(&self) -> String {
        format!("colorbar_{}.png", self.display_name)
    }

    /// Static plot file name: `<key>_data_<year>.png`
    pub fn plot_file_name(&self, year: Year) -> String {
        format!("{}_data_{}.png", self.key, year)
    }

    /// Plot title, e.g. `Temperature_2m Data for 1990`.
    pub fn plot_title(&self, year: Year) -> String {
        format!("{} Data for {}", capitalize(&self.key), year)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Inclusive span of years to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSpan {
    pub first: Year,
    pub last: Year,
}

impl YearSpan {
    pub fn new(first: Year, last: Year) -> Self {
        Self { first, last }
    }

    /// Check that the span is ordered and lies within the study period.
    pub fn validate(&self) -> Result<(), String> {
        if self.first > self.last {
            return Err(format!("first year {} is after last year {}", self.first, self.last));
        }
        if self.first < FIRST_YEAR || self.last > LAST_YEAR {
            return Err(format!(
                "years {}-{} fall outside {}-{}",
                self.first, self.last, FIRST_YEAR, LAST_YEAR
            ));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Year> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for YearSpan {
    fn default() -> Self {
        Self::new(FIRST_YEAR, LAST_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let band = Band::new("temperature_2m", "Temperature_2m", "K", "hot");
        assert_eq!(band.source_file_name("Crete", 1990), "Crete_Temperature_2m_1990.tif");
        assert_eq!(band.overlay_file_name("Crete", 2020), "Crete_Temperature_2m_2020.png");
        assert_eq!(band.colorbar_file_name(), "colorbar_Temperature_2m.png");
        assert_eq!(band.plot_file_name(2001), "temperature_2m_data_2001.png");
    }

    #[test]
    fn test_plot_title_capitalizes_key() {
        let band = Band::new("total_Precipitation", "Total_Precipitation", "mm", "Blues");
        assert_eq!(band.plot_title(1995), "Total_precipitation Data for 1995");
    }

    #[test]
    fn test_year_span() {
        let span = YearSpan::default();
        assert_eq!(span.len(), 31);
        assert_eq!(span.iter().next(), Some(1990));
        assert_eq!(span.iter().last(), Some(2020));
        assert!(span.validate().is_ok());

        assert!(YearSpan::new(1995, 1990).validate().is_err());
        assert!(YearSpan::new(1985, 1990).validate().is_err());
        assert!(YearSpan::new(2010, 2021).validate().is_err());
    }
}
