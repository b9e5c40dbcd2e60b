//! climate-viz service library.
//!
//! Turns yearly GeoTIFFs of one region into plots, transparent overlays,
//! colour-bar legends, terrain views, GIFs, normalised CSV series and a
//! static web map. The binary in `main.rs` is a thin CLI over [`pipeline`].

pub mod config;
pub mod map;
pub mod pipeline;
pub mod report;
pub mod series;

pub use config::VizConfig;
pub use pipeline::{OutputLayout, Pipeline, Stages};
pub use report::{ArtifactKind, BatchReport, ItemOutcome, Status};
