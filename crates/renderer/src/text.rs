//! Text labels on figures.
//!
//! Fonts are loaded from disk at startup. When none of the candidate files
//! can be loaded, figures are still produced, only without text.

use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

/// Font files tried when no font is configured.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Draws text with an optional font.
#[derive(Clone, Default)]
pub struct Labeler {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for Labeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Labeler")
            .field("font_loaded", &self.font.is_some())
            .finish()
    }
}

impl Labeler {
    /// Labeler that draws nothing.
    pub fn none() -> Self {
        Self { font: None }
    }

    /// Load the first readable font among `candidates`, falling back to
    /// [`DEFAULT_FONT_PATHS`] when the list is empty.
    pub fn load(candidates: &[PathBuf]) -> Self {
        let defaults: Vec<PathBuf>;
        let paths = if candidates.is_empty() {
            defaults = DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect();
            &defaults
        } else {
            candidates
        };

        for path in paths {
            if let Some(font) = load_font(path) {
                debug!(path = %path.display(), "Loaded label font");
                return Self { font: Some(font) };
            }
        }

        warn!(
            tried = paths.len(),
            "No usable font found, figures will be rendered without labels"
        );
        Self::none()
    }

    /// Use an already parsed font.
    pub fn from_font(font: Font<'static>) -> Self {
        Self { font: Some(font) }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Width and height of `text` at `size` pixels, (0, 0) without a font.
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        match &self.font {
            Some(font) => text_size(Scale::uniform(size), font, text),
            None => (0, 0),
        }
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn draw(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) {
        if let Some(font) = &self.font {
            draw_text_mut(img, color, x, y, Scale::uniform(size), font, text);
        }
    }

    /// Draw `text` horizontally centred on `cx`.
    pub fn draw_centered(
        &self,
        img: &mut RgbaImage,
        text: &str,
        cx: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (w, _) = self.measure(text, size);
        self.draw(img, text, cx - w / 2, y, size, color);
    }

    /// Draw `text` rotated 90° counter-clockwise, reading bottom to top, with
    /// its box vertically centred on `cy` and its left edge at `x`.
    pub fn draw_vertical(
        &self,
        img: &mut RgbaImage,
        text: &str,
        x: i32,
        cy: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let Some(font) = &self.font else {
            return;
        };
        let (w, h) = text_size(Scale::uniform(size), font, text);
        if w <= 0 || h <= 0 {
            return;
        }
        // Pad for descenders
        let mut strip = RgbaImage::new(w as u32 + 2, (h as f32 * 1.4) as u32 + 2);
        draw_text_mut(&mut strip, color, 1, 1, Scale::uniform(size), font, text);
        let rotated = imageops::rotate270(&strip);
        let top = cy - rotated.height() as i32 / 2;
        imageops::overlay(img, &rotated, x as i64, top as i64);
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = std::fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}
