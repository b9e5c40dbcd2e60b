//! Error types for the raster visualization pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for raster loading, alignment and rendering.
///
/// Variants are split by how the batch treats them: `FileRead` during setup
/// is fatal to the run, `MissingFile`, `Alignment` and `Write` skip a single
/// (band, year) item, `EmptySequence` skips one band's animation.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Input Errors ===
    #[error("Failed to read raster {path}: {reason}")]
    FileRead { path: PathBuf, reason: String },

    #[error("Raster file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("Failed to decode raster {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    // === Processing Errors ===
    #[error("Alignment failed: {0}")]
    Alignment(String),

    #[error("No frames to animate for band '{band}'")]
    EmptySequence { band: String },

    #[error("Rendering failed: {0}")]
    Render(String),

    // === Output Errors ===
    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    // === Setup Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RasterError {
    /// Create a FileRead error.
    pub fn file_read(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::FileRead {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create a MissingFile error.
    pub fn missing_file(path: impl AsRef<Path>) -> Self {
        Self::MissingFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a Decode error.
    pub fn decode(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an Alignment error.
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    /// Create a Write error.
    pub fn write(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create a Render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Whether the batch should keep going after this error.
    ///
    /// Only setup failures (unreadable reference data, bad configuration)
    /// stop a run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RasterError::FileRead { .. } | RasterError::Config(_))
    }

    /// Short machine-readable kind, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RasterError::FileRead { .. } => "file_read",
            RasterError::MissingFile { .. } => "missing_file",
            RasterError::Decode { .. } => "decode",
            RasterError::Alignment(_) => "alignment",
            RasterError::EmptySequence { .. } => "empty_sequence",
            RasterError::Render(_) => "render",
            RasterError::Write { .. } => "write",
            RasterError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::Render(format!("JSON error: {}", err))
    }
}
