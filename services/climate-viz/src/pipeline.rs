//! Two-phase batch over bands and years.
//!
//! ```text
//! for band:
//!   phase 1  accumulate_range(all years) ──► Option<GlobalRange> (frozen)
//!   phase 2  for year: load_year ──► stats ─► plot / overlay / terrain
//!            colour bar, normalised CSV, GIF from the band's plots
//! map page once, for every selected band
//! ```
//!
//! Items fail independently: a missing year, an alignment failure or a
//! write error is recorded in the [`BatchReport`] and the run moves on.
//! Only the reference grid is required up front.

use grid_processor::{
    accumulate_range, normalize_series, BandLoader, LoadedYear, RasterDataset, ReferenceGrid, YearStatistics,
};
use raster_common::{Band, GlobalRange, RasterError, RasterResult, Year};
use renderer::animation::animate_band;
use renderer::colorbar::write_colorbar;
use renderer::colormap::Colormap;
use renderer::gradient::colorize;
use renderer::plot::{write_plot, PlotLayout, PlotRequest};
use renderer::png::write_png;
use renderer::terrain::{write_terrain, TerrainRequest};
use renderer::text::Labeler;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

use crate::config::VizConfig;
use crate::map::write_map;
use crate::report::{ArtifactKind, BandSummary, BatchReport, ItemOutcome};
use crate::series::write_series_csv;

// ============================================================================
// Stage selection
// ============================================================================

/// Which artifacts a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stages {
    pub plots: bool,
    pub overlays: bool,
    pub colorbars: bool,
    pub terrain: bool,
    pub animate: bool,
    pub stats: bool,
    pub map: bool,
}

impl Stages {
    pub fn all() -> Self {
        Self {
            plots: true,
            overlays: true,
            colorbars: true,
            terrain: true,
            animate: true,
            stats: true,
            map: true,
        }
    }

    pub fn only(kind: ArtifactKind) -> Self {
        let mut s = Self::default();
        match kind {
            ArtifactKind::Plot => s.plots = true,
            ArtifactKind::Overlay => s.overlays = true,
            ArtifactKind::Colorbar => s.colorbars = true,
            ArtifactKind::Terrain => s.terrain = true,
            ArtifactKind::Animation => s.animate = true,
            ArtifactKind::Stats => s.stats = true,
            ArtifactKind::Map => s.map = true,
            ArtifactKind::Range => {}
        }
        s
    }

    fn renders_years(&self) -> bool {
        self.plots || self.overlays || self.terrain
    }

    fn needs_range(&self) -> bool {
        self.renders_years() || self.colorbars
    }

    fn year_kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = Vec::new();
        if self.plots {
            kinds.push(ArtifactKind::Plot);
        }
        if self.overlays {
            kinds.push(ArtifactKind::Overlay);
        }
        if self.terrain {
            kinds.push(ArtifactKind::Terrain);
        }
        kinds
    }
}

// ============================================================================
// Output layout
// ============================================================================

/// Where each artifact goes under the output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    location: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, location: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            location: location.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plots_dir(&self, band: &Band) -> PathBuf {
        self.root.join("plots").join(&band.key)
    }

    pub fn plot_path(&self, band: &Band, year: Year) -> PathBuf {
        self.plots_dir(band).join(band.plot_file_name(year))
    }

    pub fn overlay_path(&self, band: &Band, year: Year) -> PathBuf {
        self.root
            .join("overlays")
            .join(band.overlay_file_name(&self.location, year))
    }

    pub fn colorbar_path(&self, band: &Band) -> PathBuf {
        self.root.join("colorbars").join(band.colorbar_file_name())
    }

    pub fn terrain_path(&self, band: &Band, year: Year) -> PathBuf {
        self.root
            .join("terrain")
            .join(&band.key)
            .join(band.overlay_file_name(&self.location, year))
    }

    pub fn gif_path(&self, band: &Band) -> PathBuf {
        self.root.join("gifs").join(format!("{}.gif", band.key))
    }

    pub fn stats_path(&self, band: &Band) -> PathBuf {
        self.root
            .join("stats")
            .join(format!("normalized_{}_data.csv", band.key))
    }

    pub fn map_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.json")
    }
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct Pipeline<'a> {
    config: &'a VizConfig,
    reference: ReferenceGrid,
    loader: BandLoader,
    labeler: Labeler,
    layout: OutputLayout,
    /// Reference pixel centres, for terrain meshes
    mesh: (Vec<f64>, Vec<f64>),
}

impl<'a> Pipeline<'a> {
    /// Load the reference grid and prepare loaders. Fails only on setup:
    /// an unreadable reference grid is fatal to the run.
    pub fn new(config: &'a VizConfig) -> RasterResult<Self> {
        let reference = ReferenceGrid::load(&config.reference)?;
        let shape = reference.shape();
        info!(
            path = %config.reference.display(),
            width = shape.width,
            height = shape.height,
            crs = %reference.crs(),
            "Loaded reference grid"
        );
        let mesh = reference.coordinates();
        Ok(Self {
            config,
            loader: BandLoader::new(&config.input_root, &config.location, config.resampling),
            labeler: Labeler::load(&config.fonts),
            layout: OutputLayout::new(&config.output_root, &config.location),
            reference,
            mesh,
        })
    }

    /// Replace the label font source.
    pub fn with_labeler(mut self, labeler: Labeler) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn reference(&self) -> &ReferenceGrid {
        &self.reference
    }

    /// Process `bands` for the selected stages and return what happened.
    pub fn run(&self, bands: &[&Band], stages: Stages) -> BatchReport {
        let mut report = BatchReport::new(&self.config.location);

        for band in bands {
            let span = info_span!("band", band = %band.key);
            let _guard = span.enter();
            self.run_band(band, stages, &mut report);
        }

        if stages.map {
            let path = self.layout.map_path(&self.config.map.file_name);
            let outcome = match write_map(
                &path,
                &self.config.map,
                &self.config.location,
                bands,
                self.config.years,
            ) {
                Ok(()) => ItemOutcome::written(None, None, ArtifactKind::Map, &path),
                Err(e) => {
                    warn!(error = %e, "Failed to write map");
                    ItemOutcome::failed(None, None, ArtifactKind::Map, &e)
                }
            };
            report.record(outcome);
        }

        report.finish();
        info!(
            written = report.written(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Batch complete"
        );
        report
    }

    fn run_band(&self, band: &Band, stages: Stages, report: &mut BatchReport) {
        let key = Some(band.key.as_str());

        // Phase 1: frozen range, or None when the band has no data at all
        let range = if stages.needs_range() {
            let scan = accumulate_range(&self.loader, band, self.config.years.iter(), &self.reference);
            report.bands.push(BandSummary {
                band: band.key.clone(),
                range: scan.range,
                contributing_years: scan.contributing.clone(),
                skipped_years: scan.skipped.iter().map(|(y, _)| *y).collect(),
            });
            if scan.range.is_none() {
                warn!("No valid samples in any year, band cannot be rendered");
                report.record(ItemOutcome::skipped(
                    key,
                    None,
                    ArtifactKind::Range,
                    "no valid samples in any year",
                ));
            }
            scan.range
        } else {
            None
        };

        if stages.colorbars {
            report.record(self.colorbar(band, range));
        }

        // Phase 2
        let render = stages.renders_years() && range.is_some();
        if render || stages.stats {
            let maps = match self.band_colormaps(band) {
                Ok(maps) => maps,
                Err(e) => {
                    warn!(error = %e, "Colour map unavailable");
                    for kind in stages.year_kinds() {
                        report.record(ItemOutcome::failed(key, None, kind, &e));
                    }
                    return;
                }
            };
            let mut means = Vec::with_capacity(self.config.years.len());
            for year in self.config.years.iter() {
                let mean = self.run_year(band, year, range.filter(|_| render), &maps, stages, report);
                means.push((year, mean));
            }

            if stages.stats {
                let path = self.layout.stats_path(band);
                let series = normalize_series(&means);
                report.record(match write_series_csv(&path, &series) {
                    Ok(()) => {
                        info!(path = %path.display(), "Saved normalised series");
                        ItemOutcome::written(key, None, ArtifactKind::Stats, &path)
                    }
                    Err(e) => ItemOutcome::failed(key, None, ArtifactKind::Stats, &e),
                });
            }
        }

        if stages.animate {
            report.record(self.animate(band));
        }
    }

    /// Render one year. Returns the year's mean for the normalised series.
    fn run_year(
        &self,
        band: &Band,
        year: Year,
        range: Option<GlobalRange>,
        maps: &BandColormaps,
        stages: Stages,
        report: &mut BatchReport,
    ) -> Option<f64> {
        let key = Some(band.key.as_str());
        let kinds = if range.is_some() { stages.year_kinds() } else { Vec::new() };

        let LoadedYear { source, aligned: dataset } = match self.loader.load_year(band, year, &self.reference) {
            Ok(loaded) => loaded,
            Err(e @ RasterError::MissingFile { .. }) => {
                debug!(year, error = %e, "Skipping missing year");
                for &kind in &kinds {
                    report.record(ItemOutcome::skipped(key, Some(year), kind, e.to_string()));
                }
                return None;
            }
            Err(e) => {
                warn!(year, error = %e, "Failed to load year");
                for &kind in &kinds {
                    report.record(ItemOutcome::failed(key, Some(year), kind, &e));
                }
                return None;
            }
        };

        // Statistics over the stored cells, not the resampled grid
        let stats = YearStatistics::from_samples(year, source.data());
        let Some(stats) = stats.filter(|_| dataset.valid_count() > 0) else {
            info!(year, "All samples are no-data, skipping year");
            for &kind in &kinds {
                report.record(ItemOutcome::skipped(key, Some(year), kind, "all samples are no-data"));
            }
            return None;
        };
        debug!(year, min = stats.min, max = stats.max, mean = stats.mean, "Year statistics");

        if let Some(range) = range {
            for kind in kinds {
                let (path, result) = match kind {
                    ArtifactKind::Plot => {
                        let path = self.layout.plot_path(band, year);
                        let result = self.plot(&path, band, year, &dataset, range, &maps.plot);
                        (path, result)
                    }
                    ArtifactKind::Overlay => {
                        let path = self.layout.overlay_path(band, year);
                        let raster = colorize(
                            dataset.data(),
                            dataset.width(),
                            dataset.height(),
                            range,
                            &maps.plot,
                        );
                        let result = write_png(&path, &raster);
                        (path, result)
                    }
                    _ => {
                        let path = self.layout.terrain_path(band, year);
                        let result = self.terrain(&path, band, year, &dataset, range, &maps.terrain);
                        (path, result)
                    }
                };
                report.record(match result {
                    Ok(()) => {
                        debug!(year, artifact = %kind, path = %path.display(), "Saved artifact");
                        ItemOutcome::written(key, Some(year), kind, &path)
                    }
                    Err(e) => {
                        warn!(year, artifact = %kind, error = %e, "Failed to write artifact");
                        ItemOutcome::failed(key, Some(year), kind, &e)
                    }
                });
            }
        }

        Some(stats.mean)
    }

    fn plot(
        &self,
        path: &Path,
        band: &Band,
        year: Year,
        dataset: &RasterDataset,
        range: GlobalRange,
        colormap: &Colormap,
    ) -> RasterResult<()> {
        let title = band.plot_title(year);
        let req = PlotRequest {
            data: dataset.data(),
            width: dataset.width(),
            height: dataset.height(),
            range,
            colormap,
            title: &title,
            unit: &band.unit,
        };
        write_plot(path, &req, &PlotLayout::default(), &self.labeler)
    }

    fn terrain(
        &self,
        path: &Path,
        band: &Band,
        year: Year,
        dataset: &RasterDataset,
        range: GlobalRange,
        colormap: &Colormap,
    ) -> RasterResult<()> {
        let title = format!("{}_{}_{}", self.config.location, band.display_name, year);
        let legend = format!("{} ({})", title, band.unit);
        let shape = self.reference.shape();
        let req = TerrainRequest {
            xs: &self.mesh.0,
            ys: &self.mesh.1,
            elevation: self.reference.elevation(),
            values: dataset.data(),
            width: shape.width,
            height: shape.height,
            range,
            colormap,
            title: &title,
            legend: &legend,
        };
        write_terrain(path, &req, &self.config.terrain.view(), &self.labeler)
    }

    /// Standalone legend, on the band's fixed legend range when configured.
    fn colorbar(&self, band: &Band, range: Option<GlobalRange>) -> ItemOutcome {
        let key = Some(band.key.as_str());
        let legend = band
            .legend_range
            .and_then(|[lo, hi]| GlobalRange::new(lo, hi))
            .or(range);
        let Some(legend) = legend else {
            return ItemOutcome::skipped(key, None, ArtifactKind::Colorbar, "no legend range");
        };

        let path = self.layout.colorbar_path(band);
        let result = self.config.colormap(&band.colormap).and_then(|map| {
            write_colorbar(&path, &band.display_name, &band.unit, &map, legend, &self.labeler)
        });
        match result {
            Ok(()) => {
                info!(path = %path.display(), "Saved colour bar");
                ItemOutcome::written(key, None, ArtifactKind::Colorbar, &path)
            }
            Err(e) => {
                warn!(error = %e, "Failed to write colour bar");
                ItemOutcome::failed(key, None, ArtifactKind::Colorbar, &e)
            }
        }
    }

    /// GIF of the band's plots, in year order.
    fn animate(&self, band: &Band) -> ItemOutcome {
        let key = Some(band.key.as_str());
        let output = self.layout.gif_path(band);
        let prefix = format!("{}_data_", band.key);
        match animate_band(
            &self.layout.plots_dir(band),
            Some(&prefix),
            &output,
            self.config.animation.frame_delay_ms,
            &band.key,
        ) {
            Ok(_) => ItemOutcome::written(key, None, ArtifactKind::Animation, &output),
            Err(e) => {
                warn!(error = %e, "Animation failed");
                ItemOutcome::failed(key, None, ArtifactKind::Animation, &e)
            }
        }
    }

    fn band_colormaps(&self, band: &Band) -> RasterResult<BandColormaps> {
        Ok(BandColormaps {
            plot: self.config.colormap(&band.colormap)?,
            terrain: self.config.terrain_colormap(band)?,
        })
    }
}

struct BandColormaps {
    plot: Colormap,
    terrain: Colormap,
}
