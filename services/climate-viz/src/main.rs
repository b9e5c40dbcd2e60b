//! climate-viz command line.
//!
//! Renders yearly climate rasters for one region into static artifacts.
//! Exits non-zero only when setup fails; per-item failures end up in
//! `report.json` under the output root.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use climate_viz::{ArtifactKind, Pipeline, Stages, VizConfig};

#[derive(Parser, Debug)]
#[command(name = "climate-viz")]
#[command(about = "Render yearly climate rasters into plots, overlays, terrain views, GIFs and a web map")]
struct Args {
    /// Configuration file path (built-in Crete defaults when omitted)
    #[arg(short, long, global = true, env = "CLIMATE_VIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Only process this band key (repeatable)
    #[arg(short, long = "band", global = true)]
    bands: Vec<String>,

    /// Override the input directory
    #[arg(long, global = true)]
    input_root: Option<PathBuf>,

    /// Override the output directory
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Static per-year plots with a colour bar
    Plots,
    /// Transparent colour-mapped overlays for the web map
    Overlays,
    /// Standalone colour-bar legends
    Colorbars,
    /// Terrain views draped over the reference elevation
    Terrain,
    /// GIFs from previously written plots
    Animate,
    /// The interactive web map page
    Map,
    /// Normalised yearly mean CSVs
    Stats,
    /// Everything above
    All,
}

impl Command {
    fn stages(self) -> Stages {
        match self {
            Command::Plots => Stages::only(ArtifactKind::Plot),
            Command::Overlays => Stages::only(ArtifactKind::Overlay),
            Command::Colorbars => Stages::only(ArtifactKind::Colorbar),
            Command::Terrain => Stages::only(ArtifactKind::Terrain),
            Command::Animate => Stages::only(ArtifactKind::Animation),
            Command::Map => Stages::only(ArtifactKind::Map),
            Command::Stats => Stages::only(ArtifactKind::Stats),
            Command::All => Stages::all(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let mut config = match &args.config {
        Some(path) => VizConfig::load(path)?,
        None => {
            info!("No config file given, using built-in defaults");
            VizConfig::default()
        }
    };
    if let Some(root) = args.input_root {
        config.input_root = root;
    }
    if let Some(root) = args.output_root {
        config.output_root = root;
    }

    let bands = config.select_bands(&args.bands)?;
    info!(
        command = ?args.command,
        location = %config.location,
        bands = ?bands.iter().map(|b| b.key.as_str()).collect::<Vec<_>>(),
        years = %format!("{}-{}", config.years.first, config.years.last),
        "Starting climate-viz"
    );

    let pipeline = Pipeline::new(&config).context("Failed to load the reference grid")?;
    let report = pipeline.run(&bands, args.command.stages());

    let report_path = pipeline.layout().report_path();
    if let Err(e) = report.write_json(&report_path) {
        warn!(error = %e, "Could not write batch report");
    } else {
        info!(path = %report_path.display(), "Saved batch report");
    }

    Ok(())
}
