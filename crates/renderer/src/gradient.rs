//! Colour mapping of gridded data into RGBA rasters.

use image::RgbaImage;
use raster_common::GlobalRange;
use rayon::prelude::*;

use crate::colormap::Colormap;

/// Row-major RGBA pixels, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaRaster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RgbaRaster {
    /// Fully transparent raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
        }
    }

    /// Wrap existing pixels. `None` if the buffer size does not match.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width * height * 4).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA of pixel (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Alpha channel only.
    pub fn alpha(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels.chunks_exact(4).map(|p| p[3])
    }

    /// Copy into an `image` buffer for compositing.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width as u32, self.height as u32))
    }
}

impl From<RgbaImage> for RgbaRaster {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }
}

/// Map values to colours against a fixed range.
///
/// Each finite value is normalised with `(v - min) / (max - min)`, clamped to
/// [0, 1] and looked up in `colormap` with alpha 255. NaN (no-data) becomes
/// `[0, 0, 0, 0]`. The output depends only on the inputs, so repeated calls
/// give identical bytes.
pub fn colorize(
    data: &[f32],
    width: usize,
    height: usize,
    range: GlobalRange,
    colormap: &Colormap,
) -> RgbaRaster {
    let mut raster = RgbaRaster::new(width, height);
    if width == 0 || height == 0 {
        return raster;
    }
    let lut = colormap.lut();

    raster
        .pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let value = data.get(y * width + x).copied().unwrap_or(f32::NAN);
                if !value.is_finite() {
                    continue;
                }
                let t = range.normalize(value);
                let color = lut[(t * 255.0).round() as usize];
                px.copy_from_slice(&[color.r, color.g, color.b, 255]);
            }
        });

    raster
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hot() -> Colormap {
        Colormap::builtin("hot").unwrap()
    }

    #[test]
    fn test_nan_is_transparent() {
        let range = GlobalRange::new(0.0, 10.0).unwrap();
        let raster = colorize(&[f32::NAN, 5.0], 2, 1, range, &hot());
        assert_eq!(raster.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(raster.pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_endpoints_map_to_colormap_ends() {
        let map = hot();
        let range = GlobalRange::new(270.0, 310.0).unwrap();
        let raster = colorize(&[270.0, 310.0, 250.0, 330.0], 4, 1, range, &map);
        assert_eq!(raster.pixel(0, 0), map.sample(0.0).to_array());
        assert_eq!(raster.pixel(1, 0), map.sample(1.0).to_array());
        // Out-of-range values clamp
        assert_eq!(raster.pixel(2, 0), raster.pixel(0, 0));
        assert_eq!(raster.pixel(3, 0), raster.pixel(1, 0));
    }

    #[test]
    fn test_degenerate_range_uses_first_colour() {
        let map = hot();
        let range = GlobalRange::new(5.0, 5.0).unwrap();
        let raster = colorize(&[5.0, 5.0], 2, 1, range, &map);
        assert_eq!(raster.pixel(0, 0), map.sample(0.0).to_array());
    }

    #[test]
    fn test_from_pixels_checks_size() {
        assert!(RgbaRaster::from_pixels(2, 2, vec![0; 16]).is_some());
        assert!(RgbaRaster::from_pixels(2, 2, vec![0; 15]).is_none());
    }
}
