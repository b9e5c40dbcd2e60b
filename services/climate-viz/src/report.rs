//! Per-run record of what was written, skipped and failed.

use chrono::{DateTime, Utc};
use raster_common::{GlobalRange, RasterError, RasterResult, Year};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of artifact an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Phase 1 range scan of a band
    Range,
    Plot,
    Overlay,
    Colorbar,
    Terrain,
    Animation,
    Stats,
    Map,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Range => "range",
            ArtifactKind::Plot => "plot",
            ArtifactKind::Overlay => "overlay",
            ArtifactKind::Colorbar => "colorbar",
            ArtifactKind::Terrain => "terrain",
            ArtifactKind::Animation => "animation",
            ArtifactKind::Stats => "stats",
            ArtifactKind::Map => "map",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    Written { path: PathBuf },
    Skipped { reason: String },
    Failed { kind: String, error: String },
}

/// Result of one (band, year, artifact) item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Band key, absent for run-wide artifacts like the map
    pub band: Option<String>,
    pub year: Option<Year>,
    pub artifact: ArtifactKind,
    #[serde(flatten)]
    pub status: Status,
}

impl ItemOutcome {
    pub fn written(band: Option<&str>, year: Option<Year>, artifact: ArtifactKind, path: &Path) -> Self {
        Self {
            band: band.map(str::to_string),
            year,
            artifact,
            status: Status::Written {
                path: path.to_path_buf(),
            },
        }
    }

    pub fn skipped(
        band: Option<&str>,
        year: Option<Year>,
        artifact: ArtifactKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            band: band.map(str::to_string),
            year,
            artifact,
            status: Status::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(band: Option<&str>, year: Option<Year>, artifact: ArtifactKind, err: &RasterError) -> Self {
        Self {
            band: band.map(str::to_string),
            year,
            artifact,
            status: Status::Failed {
                kind: err.kind().to_string(),
                error: err.to_string(),
            },
        }
    }
}

/// Phase 1 summary for one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    pub band: String,
    pub range: Option<GlobalRange>,
    pub contributing_years: Vec<Year>,
    pub skipped_years: Vec<Year>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub location: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub bands: Vec<BandSummary>,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            started_at: Utc::now(),
            finished_at: None,
            bands: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        self.items.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, Status::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, Status::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    /// Outcomes for one band and artifact kind, in recording order.
    pub fn items_for<'a>(
        &'a self,
        band: &'a str,
        artifact: ArtifactKind,
    ) -> impl Iterator<Item = &'a ItemOutcome> + 'a {
        self.items
            .iter()
            .filter(move |i| i.artifact == artifact && i.band.as_deref() == Some(band))
    }

    pub fn band_summary(&self, band: &str) -> Option<&BandSummary> {
        self.bands.iter().find(|b| b.band == band)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> RasterResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RasterError::write(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| RasterError::write(path, e))
    }
}
