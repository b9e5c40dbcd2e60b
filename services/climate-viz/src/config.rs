//! Run configuration for climate-viz.
//!
//! Loaded once from YAML, validated, then passed by reference to every
//! stage. Path fields support `${VAR}`, `${VAR:-default}` and `~`.
//! Every section falls back to the Crete dataset defaults.

use anyhow::{Context, Result};
use grid_processor::InterpolationMethod;
use raster_common::{Band, RasterError, RasterResult, YearSpan};
use renderer::colormap::Colormap;
use renderer::terrain::TerrainView;
use renderer::DEFAULT_FRAME_DELAY_MS;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Directory holding `<Location>_<Band>_<Year>.tif` inputs
    pub input_root: PathBuf,
    /// Directory all artifacts are written under
    pub output_root: PathBuf,
    /// Elevation raster defining the target grid
    pub reference: PathBuf,
    /// File name prefix of inputs and overlays, e.g. `Crete`
    pub location: String,
    pub years: YearSpan,
    pub resampling: InterpolationMethod,
    /// Candidate TrueType fonts for labels, first readable one wins
    pub fonts: Vec<PathBuf>,
    pub bands: Vec<Band>,
    /// Custom colour maps: name -> hex stops, evenly spaced
    pub colormaps: BTreeMap<String, Vec<String>>,
    pub terrain: TerrainConfig,
    pub animation: AnimationConfig,
    pub map: MapConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("data"),
            output_root: PathBuf::from("output"),
            reference: PathBuf::from("data/crete_dem.tif"),
            location: "Crete".to_string(),
            years: YearSpan::default(),
            resampling: InterpolationMethod::Nearest,
            fonts: Vec::new(),
            bands: default_bands(),
            colormaps: BTreeMap::new(),
            terrain: TerrainConfig::default(),
            animation: AnimationConfig::default(),
            map: MapConfig::default(),
        }
    }
}

fn default_bands() -> Vec<Band> {
    let band = |key: &str, display: &str, unit: &str, cmap: &str, legend: Option<[f32; 2]>| {
        let mut b = Band::new(key, display, unit, cmap);
        b.legend_range = legend;
        b
    };
    vec![
        band("temperature_2m", "Temperature_2m", "K", "hot", Some([270.0, 310.0])),
        band("total_Precipitation", "Total_Precipitation", "mm", "Blues", Some([0.0, 300.0])),
        band("soil_Moisture", "Soil_Moisture", "m³/m³", "Greens", Some([0.0, 1.0])),
        band("surface_Pressure", "Surface_Pressure", "Pa", "Oranges", None),
        band("wind_U", "Wind_U", "m/s", "Purples", Some([0.0, 15.0])),
    ]
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub warp_factor: f64,
    pub width: u32,
    pub height: u32,
    /// Per-band colour map overrides for terrain views, keyed by band key
    pub colormaps: BTreeMap<String, String>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        let view = TerrainView::default();
        Self {
            azimuth_deg: view.azimuth_deg,
            elevation_deg: view.elevation_deg,
            warp_factor: view.warp_factor,
            width: view.width,
            height: view.height,
            colormaps: BTreeMap::from([("temperature_2m".to_string(), "coolwarm".to_string())]),
        }
    }
}

impl TerrainConfig {
    pub fn view(&self) -> TerrainView {
        TerrainView {
            azimuth_deg: self.azimuth_deg,
            elevation_deg: self.elevation_deg,
            warp_factor: self.warp_factor,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay between frames in milliseconds
    pub frame_delay_ms: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

/// A plain marker on the web map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_marker_color")]
    pub color: String,
}

fn default_marker_color() -> String {
    "blue".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Output file name under `output_root`
    pub file_name: String,
    /// Where overlays and colour bars are served from
    pub base_url: String,
    /// Initial view: [lat, lon] and zoom
    pub center: [f64; 2],
    pub zoom: u8,
    /// Region marker position and the zoom used by its button
    pub region_center: [f64; 2],
    pub region_zoom: u8,
    /// Overlay placement: [[south, west], [north, east]]
    pub overlay_bounds: [[f64; 2]; 2],
    pub overlay_opacity: f64,
    /// Colour bar placement: [[south, west], [north, east]]
    pub colorbar_bounds: [[f64; 2]; 2],
    /// Year the slider starts on
    pub initial_year: i32,
    pub markers: Vec<MapMarker>,
    /// Labels for the band selector, keyed by display name
    pub band_labels: BTreeMap<String, String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        let label = |k: &str, v: &str| (k.to_string(), v.to_string());
        Self {
            file_name: "map.html".to_string(),
            base_url: "http://localhost:8000".to_string(),
            center: [39.0742, 21.8243],
            zoom: 6,
            region_center: [35.2401, 24.8093],
            region_zoom: 8,
            overlay_bounds: [[34.8, 23.3], [35.8, 26.7]],
            overlay_opacity: 0.6,
            colorbar_bounds: [[34.8, 22.9], [36.0, 23.3]],
            initial_year: 2000,
            markers: vec![
                MapMarker {
                    name: "Athens".to_string(),
                    lat: 37.9838,
                    lon: 23.7275,
                    color: "beige".to_string(),
                },
                MapMarker {
                    name: "Thessaloniki".to_string(),
                    lat: 40.6401,
                    lon: 22.9444,
                    color: "lightblue".to_string(),
                },
            ],
            band_labels: BTreeMap::from([
                label("Temperature_2m", "Temperature"),
                label("Total_Precipitation", "Precipitation"),
                label("Soil_Moisture", "Soil Moisture"),
                label("Surface_Pressure", "Surface Pressure"),
                label("Wind_U", "Wind U"),
            ]),
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl VizConfig {
    /// Read, expand and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {:?}", path))
    }

    /// Parse YAML content, expand paths and validate.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: VizConfig =
            serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    fn expand_paths(&mut self) -> Result<()> {
        self.input_root = expand_path(&self.input_root)?;
        self.output_root = expand_path(&self.output_root)?;
        self.reference = expand_path(&self.reference)?;
        for font in &mut self.fonts {
            *font = expand_path(font)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.location.is_empty(), "location cannot be empty");
        self.years.validate().map_err(anyhow::Error::msg)?;
        anyhow::ensure!(!self.bands.is_empty(), "at least one band must be configured");

        let mut keys = HashSet::new();
        for band in &self.bands {
            anyhow::ensure!(!band.key.is_empty(), "band key cannot be empty");
            anyhow::ensure!(keys.insert(&band.key), "duplicate band key: {}", band.key);
            anyhow::ensure!(
                !band.display_name.is_empty(),
                "band {} has no display name",
                band.key
            );
            self.colormap(&band.colormap)?;
            if let Some(name) = self.terrain.colormaps.get(&band.key) {
                self.colormap(name)?;
            }
            if let Some([lo, hi]) = band.legend_range {
                anyhow::ensure!(
                    lo.is_finite() && hi.is_finite() && lo <= hi,
                    "band {} has an invalid legend range [{}, {}]",
                    band.key,
                    lo,
                    hi
                );
            }
        }

        for name in self.colormaps.keys() {
            self.colormap(name)?;
        }

        anyhow::ensure!(
            self.terrain.warp_factor.is_finite(),
            "terrain warp_factor must be finite"
        );
        anyhow::ensure!(
            self.terrain.width > 0 && self.terrain.height > 0,
            "terrain image size must be positive"
        );
        anyhow::ensure!(
            self.animation.frame_delay_ms > 0,
            "animation frame_delay_ms must be positive"
        );
        anyhow::ensure!(!self.map.base_url.is_empty(), "map base_url cannot be empty");
        anyhow::ensure!(!self.map.file_name.is_empty(), "map file_name cannot be empty");
        Ok(())
    }

    /// Resolve a colour map by name: custom maps first, then built-ins.
    pub fn colormap(&self, name: &str) -> RasterResult<Colormap> {
        if let Some(stops) = self.colormaps.get(name) {
            return Colormap::from_hex(name, stops)
                .map_err(|e| RasterError::Config(format!("colour map {}: {}", name, e)));
        }
        Colormap::builtin(name)
            .ok_or_else(|| RasterError::Config(format!("unknown colour map: {}", name)))
    }

    /// Colour map for a band's terrain views.
    pub fn terrain_colormap(&self, band: &Band) -> RasterResult<Colormap> {
        match self.terrain.colormaps.get(&band.key) {
            Some(name) => self.colormap(name),
            None => self.colormap(&band.colormap),
        }
    }

    /// Bands to process. An empty filter selects every band; an unknown key
    /// is a configuration error.
    pub fn select_bands(&self, keys: &[String]) -> RasterResult<Vec<&Band>> {
        if keys.is_empty() {
            return Ok(self.bands.iter().collect());
        }
        keys.iter()
            .map(|key| {
                self.bands
                    .iter()
                    .find(|b| b.key.eq_ignore_ascii_case(key))
                    .ok_or_else(|| RasterError::Config(format!("unknown band: {}", key)))
            })
            .collect()
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {:?}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = VizConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bands.len(), 5);
        assert_eq!(config.location, "Crete");
        assert_eq!(config.years.len(), 31);
        assert_eq!(config.animation.frame_delay_ms, 400);
        assert_eq!(config.terrain.warp_factor, 0.00005);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = VizConfig::from_yaml(
            "location: Rhodes\nresampling: bilinear\nyears:\n  first: 1995\n  last: 2000\n",
        )
        .unwrap();
        assert_eq!(config.location, "Rhodes");
        assert_eq!(config.resampling, InterpolationMethod::Bilinear);
        assert_eq!(config.years.len(), 6);
        assert_eq!(config.bands.len(), 5);
        assert_eq!(config.map.zoom, 6);
    }

    #[test]
    fn test_env_expansion_in_paths() {
        std::env::set_var("CLIMATE_VIZ_TEST_ROOT", "/srv/climate");
        let config = VizConfig::from_yaml(
            "input_root: ${CLIMATE_VIZ_TEST_ROOT}/in\noutput_root: ${CLIMATE_VIZ_UNSET_ROOT:-/tmp}/out\n",
        )
        .unwrap();
        assert_eq!(config.input_root, PathBuf::from("/srv/climate/in"));
        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_unknown_colormap_is_rejected() {
        let yaml = r#"
bands:
  - key: t
    display_name: T
    unit: K
    colormap: rainbowish
"#;
        let err = VizConfig::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown colour map"));
    }

    #[test]
    fn test_custom_colormap_and_band_options() {
        let yaml = r##"
colormaps:
  sea: ["#002b5c", "#7fb2e5", "#ffffff"]
bands:
  - key: sst
    display_name: Sea_Temperature
    unit: K
    colormap: sea
    subdir: sst
    legend_range: [280.0, 300.0]
"##;
        let config = VizConfig::from_yaml(yaml).unwrap();
        let band = &config.bands[0];
        assert_eq!(band.subdir.as_deref(), Some("sst"));
        assert_eq!(band.legend_range, Some([280.0, 300.0]));
        assert_eq!(config.colormap("sea").unwrap().name(), "sea");
        assert_eq!(config.terrain_colormap(band).unwrap().name(), "sea");
    }

    #[test]
    fn test_invalid_sections() {
        assert!(VizConfig::from_yaml("bands: []").is_err());
        assert!(VizConfig::from_yaml("years:\n  first: 2000\n  last: 1990\n").is_err());
        assert!(VizConfig::from_yaml("animation:\n  frame_delay_ms: 0\n").is_err());
        assert!(VizConfig::from_yaml("location: ''").is_err());
    }

    #[test]
    fn test_select_bands() {
        let config = VizConfig::default();
        assert_eq!(config.select_bands(&[]).unwrap().len(), 5);
        let picked = config
            .select_bands(&["wind_u".to_string(), "temperature_2m".to_string()])
            .unwrap();
        assert_eq!(picked[0].key, "wind_U");
        assert_eq!(picked[1].key, "temperature_2m");
        assert!(matches!(
            config.select_bands(&["ozone".to_string()]),
            Err(RasterError::Config(_))
        ));
    }

    #[test]
    fn test_terrain_colormap_override() {
        let config = VizConfig::default();
        assert_eq!(config.terrain_colormap(&config.bands[0]).unwrap().name(), "coolwarm");
        assert_eq!(config.terrain_colormap(&config.bands[1]).unwrap().name(), "Blues");
    }
}
