//! Looping GIF animations from a band's yearly frames.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{Delay, Frame, RgbaImage};
use raster_common::{RasterError, RasterResult};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Per-frame delay used when none is configured.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 400;

/// `*.png` files directly inside `dir`, sorted ascending by file name.
///
/// With a `prefix`, only file names starting with it are kept. A missing
/// directory yields no frames.
pub fn collect_frames(dir: &Path, prefix: Option<&str>) -> Vec<PathBuf> {
    let mut frames: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.ends_with(".png") && prefix.map_or(true, |p| name.starts_with(p))
        })
        .map(|entry| entry.into_path())
        .collect();
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    frames
}

/// Encode `frames` into a looping GIF at `output`.
///
/// Every frame shows for `delay_ms`. Frames whose size differs from the
/// first are resized to match it. All frames are decoded before anything is
/// written, and the GIF is encoded next to `output` and renamed into place,
/// so a failure leaves any previous file at `output` untouched.
pub fn encode_gif(frames: &[PathBuf], output: &Path, delay_ms: u32, band: &str) -> RasterResult<usize> {
    let images = decode_frames(frames, band)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RasterError::write(parent, e))?;
    }
    let partial = partial_path(output);
    if let Err(e) = write_gif(images, &partial, delay_ms) {
        let _ = std::fs::remove_file(&partial);
        return Err(RasterError::write(output, e));
    }
    std::fs::rename(&partial, output).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        RasterError::write(output, e)
    })?;

    Ok(frames.len())
}

fn decode_frames(frames: &[PathBuf], band: &str) -> RasterResult<Vec<RgbaImage>> {
    let Some(first) = frames.first() else {
        return Err(RasterError::EmptySequence {
            band: band.to_string(),
        });
    };
    let first_img = image::open(first)
        .map_err(|e| RasterError::decode(first, e))?
        .to_rgba8();
    let (width, height) = first_img.dimensions();

    let mut images = Vec::with_capacity(frames.len());
    images.push(first_img);
    for path in &frames[1..] {
        let mut img = image::open(path)
            .map_err(|e| RasterError::decode(path, e))?
            .to_rgba8();
        if img.dimensions() != (width, height) {
            debug!(path = %path.display(), "Resizing frame to match the first");
            img = imageops::resize(&img, width, height, FilterType::Triangle);
        }
        images.push(img);
    }
    Ok(images)
}

fn write_gif(images: Vec<RgbaImage>, path: &Path, delay_ms: u32) -> image::ImageResult<()> {
    let file = File::create(path)?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 10);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(delay_ms, 1);
    encoder.encode_frames(images.into_iter().map(|img| Frame::from_parts(img, 0, 0, delay)))
}

/// `gifs/wind_U.gif` -> `gifs/wind_U.gif.partial`
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

/// Collect a band's frames from `frames_dir` and write them as a GIF.
///
/// Returns the number of frames written. An empty directory fails with
/// [`RasterError::EmptySequence`] for this band only.
pub fn animate_band(
    frames_dir: &Path,
    prefix: Option<&str>,
    output: &Path,
    delay_ms: u32,
    band: &str,
) -> RasterResult<usize> {
    let frames = collect_frames(frames_dir, prefix);
    let count = encode_gif(&frames, output, delay_ms, band)?;
    info!(band, frames = count, output = %output.display(), "Saved GIF");
    Ok(count)
}
