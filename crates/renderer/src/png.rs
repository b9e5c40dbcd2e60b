//! PNG output for colour-mapped rasters.
//!
//! A raster coloured through a 256-entry lookup table never has more than
//! 257 distinct pixels (the table plus transparent no-data), so overlays
//! normally go out as indexed PNGs (colour type 3) with a `tRNS` chunk for
//! the alpha. Figures with antialiased text can exceed that and fall back to
//! 8-bit RGBA (colour type 6).
//!
//! Palette entries are numbered in scan order, so identical pixels always
//! encode to identical bytes.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use raster_common::{RasterError, RasterResult};
use tracing::debug;

use crate::gradient::RgbaRaster;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const MAX_PALETTE: usize = 256;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Distinct colours of an image and each pixel's index into them.
struct Palette {
    entries: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl Palette {
    /// `None` once a 257th colour turns up.
    fn scan(pixels: &[u8]) -> Option<Self> {
        let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE);
        let mut entries = Vec::with_capacity(MAX_PALETTE);
        let mut indices = Vec::with_capacity(pixels.len() / 4);

        for px in pixels.chunks_exact(4) {
            let px = [px[0], px[1], px[2], px[3]];
            let index = match lookup.get(&px) {
                Some(&i) => i,
                None if entries.len() == MAX_PALETTE => return None,
                None => {
                    let i = entries.len() as u8;
                    entries.push(px);
                    lookup.insert(px, i);
                    i
                }
            };
            indices.push(index);
        }
        Some(Self { entries, indices })
    }

    fn plte(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Per-entry alpha, or `None` when every entry is opaque.
    fn trns(&self) -> Option<Vec<u8>> {
        self.entries
            .iter()
            .any(|c| c[3] < 255)
            .then(|| self.entries.iter().map(|c| c[3]).collect())
    }
}

/// Chunk-by-chunk PNG assembly into memory.
struct PngWriter {
    out: Vec<u8>,
}

impl PngWriter {
    fn new(width: usize, height: usize, color_type: u8) -> Self {
        let mut writer = Self {
            out: SIGNATURE.to_vec(),
        };
        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&(width as u32).to_be_bytes());
        ihdr.extend_from_slice(&(height as u32).to_be_bytes());
        // bit depth 8, deflate, adaptive filtering, no interlace
        ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
        writer.chunk(b"IHDR", &ihdr);
        writer
    }

    fn chunk(&mut self, kind: &[u8; 4], data: &[u8]) {
        let mut crc = crc32fast::Hasher::new();
        crc.update(kind);
        crc.update(data);
        self.out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.out.extend_from_slice(kind);
        self.out.extend_from_slice(data);
        self.out.extend_from_slice(&crc.finalize().to_be_bytes());
    }

    /// Compress `samples` (rows of `stride` bytes, filter type 0) into IDAT.
    fn image_data(&mut self, samples: &[u8], stride: usize) -> std::io::Result<()> {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::fast());
        for row in samples.chunks_exact(stride.max(1)) {
            zlib.write_all(&[0])?;
            zlib.write_all(row)?;
        }
        let idat = zlib.finish()?;
        self.chunk(b"IDAT", &idat);
        Ok(())
    }

    fn finish(mut self) -> Vec<u8> {
        self.chunk(b"IEND", &[]);
        self.out
    }
}

fn check_len(pixels: &[u8], width: usize, height: usize) -> RasterResult<()> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(RasterError::render(format!(
            "pixel buffer has {} bytes, expected {} for {}x{}",
            pixels.len(),
            expected,
            width,
            height
        )));
    }
    Ok(())
}

fn io_failure(e: std::io::Error) -> RasterError {
    RasterError::render(format!("IDAT compression failed: {}", e))
}

/// Encode RGBA pixels, indexed when they fit a 256-colour palette.
pub fn encode_pixels(pixels: &[u8], width: usize, height: usize) -> RasterResult<Vec<u8>> {
    check_len(pixels, width, height)?;
    let Some(palette) = Palette::scan(pixels) else {
        return encode_pixels_rgba(pixels, width, height);
    };

    let mut png = PngWriter::new(width, height, COLOR_TYPE_INDEXED);
    png.chunk(b"PLTE", &palette.plte());
    if let Some(alpha) = palette.trns() {
        png.chunk(b"tRNS", &alpha);
    }
    png.image_data(&palette.indices, width).map_err(io_failure)?;
    Ok(png.finish())
}

/// Encode RGBA pixels as a truecolour-with-alpha PNG, whatever their colour count.
pub fn encode_pixels_rgba(pixels: &[u8], width: usize, height: usize) -> RasterResult<Vec<u8>> {
    check_len(pixels, width, height)?;
    let mut png = PngWriter::new(width, height, COLOR_TYPE_RGBA);
    png.image_data(pixels, width * 4).map_err(io_failure)?;
    Ok(png.finish())
}

pub fn encode_raster(raster: &RgbaRaster) -> RasterResult<Vec<u8>> {
    encode_pixels(raster.pixels(), raster.width(), raster.height())
}

/// Encode `raster` and write it to `path`, creating parent directories.
pub fn write_png(path: &Path, raster: &RgbaRaster) -> RasterResult<()> {
    let bytes = encode_raster(raster)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RasterError::write(path, e))?;
    }
    fs::write(path, &bytes).map_err(|e| RasterError::write(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote PNG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chunk types in file order.
    fn chunk_kinds(png: &[u8]) -> Vec<String> {
        let mut kinds = Vec::new();
        let mut pos = SIGNATURE.len();
        while pos + 8 <= png.len() {
            let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
            kinds.push(String::from_utf8_lossy(&png[pos + 4..pos + 8]).into_owned());
            pos += 12 + len;
        }
        kinds
    }

    #[test]
    fn test_palette_follows_scan_order() {
        let pixels = [
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red
            0, 0, 255, 255, // blue
        ];
        let palette = Palette::scan(&pixels).unwrap();
        assert_eq!(palette.entries, [[0, 0, 255, 255], [255, 0, 0, 255]]);
        assert_eq!(palette.indices, [0, 1, 0]);
        assert!(palette.trns().is_none());
    }

    #[test]
    fn test_palette_overflows_past_256() {
        let pixels: Vec<u8> = (0..257u32).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255]).collect();
        assert!(Palette::scan(&pixels).is_none());
        assert!(Palette::scan(&pixels[..256 * 4]).is_some());
    }

    #[test]
    fn test_nodata_gets_trns_chunk() {
        let pixels = [200, 10, 10, 255, 0, 0, 0, 0];
        let png = encode_pixels(&pixels, 2, 1).unwrap();
        assert_eq!(chunk_kinds(&png), ["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);

        let opaque = encode_pixels(&[200, 10, 10, 255], 1, 1).unwrap();
        assert_eq!(chunk_kinds(&opaque), ["IHDR", "PLTE", "IDAT", "IEND"]);
    }

    #[test]
    fn test_rgba_has_no_palette() {
        let png = encode_pixels_rgba(&[1, 2, 3, 4], 1, 1).unwrap();
        assert_eq!(png[25], COLOR_TYPE_RGBA);
        assert_eq!(chunk_kinds(&png), ["IHDR", "IDAT", "IEND"]);
    }

    #[test]
    fn test_chunk_crc_covers_type_and_data() {
        let png = encode_pixels(&[9, 9, 9, 255], 1, 1).unwrap();
        // IHDR: 4 length + 4 type + 13 data, CRC follows
        let body = &png[12..12 + 4 + 13];
        let crc = u32::from_be_bytes([png[29], png[30], png[31], png[32]]);
        assert_eq!(crc, crc32fast::hash(body));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let pixels = test_utils::create_palette_pixels(256, 256);
        assert_eq!(
            encode_pixels(&pixels, 256, 256).unwrap(),
            encode_pixels(&pixels, 256, 256).unwrap()
        );
    }

    #[test]
    fn test_wrong_buffer_size_is_rejected() {
        let err = encode_pixels(&[0u8; 12], 2, 2).unwrap_err();
        assert!(matches!(err, RasterError::Render(_)));
    }

    #[test]
    fn test_write_png_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlays/nested/Crete_Wind_U_1990.png");
        write_png(&path, &RgbaRaster::new(3, 2)).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..8], &SIGNATURE);
    }
}
