//! Vertical colour bars: drawn beside plots and terrain views, or written
//! as standalone legend images for the web map.

use std::path::Path;

use image::{Rgba, RgbaImage};
use raster_common::{GlobalRange, RasterResult};

use crate::colormap::Colormap;
use crate::gradient::RgbaRaster;
use crate::png::write_png;
use crate::text::{Labeler, BLACK};

/// Standalone legend size, matching a 2x8 inch figure at 100 dpi.
pub const LEGEND_WIDTH: u32 = 200;
pub const LEGEND_HEIGHT: u32 = 800;

/// Pixel rectangle on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Tick values at "nice" steps (1, 2, 2.5, 5 times a power of ten) inside
/// the range, at most `max_ticks` of them.
pub fn nice_ticks(range: GlobalRange, max_ticks: usize) -> Vec<f32> {
    let (min, max) = (range.min() as f64, range.max() as f64);
    let span = max - min;
    if span <= 0.0 || max_ticks < 2 {
        return vec![range.min()];
    }

    let raw = span / (max_ticks - 1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| span / s <= (max_ticks - 1) as f64)
        .unwrap_or(10.0 * magnitude);

    let first = (min / step).ceil() * step;
    let mut ticks = Vec::new();
    let mut v = first;
    while v <= max + step * 1e-6 {
        ticks.push(v as f32);
        v += step;
    }
    ticks
}

/// Format a tick with just enough decimals for its step.
pub fn format_tick(value: f32, step: f32) -> String {
    let step = step.abs() as f64;
    let decimals = (0..6)
        .find(|d| {
            let scaled = step * 10f64.powi(*d as i32);
            (scaled - scaled.round()).abs() < 1e-3
        })
        .unwrap_or(6);
    let s = format!("{:.*}", decimals, value);
    // Avoid "-0"
    if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        s.trim_start_matches('-').to_string()
    } else {
        s
    }
}

/// Draw a vertical colour bar into `bar`, with the maximum at the top, tick
/// labels on the right and `label` rotated beside them.
pub fn draw_colorbar(
    img: &mut RgbaImage,
    bar: Rect,
    colormap: &Colormap,
    range: GlobalRange,
    labeler: &Labeler,
    label: &str,
    font_size: f32,
) {
    let h = bar.height.max(1);
    for dy in 0..h {
        let t = 1.0 - dy as f32 / (h - 1).max(1) as f32;
        let c = colormap.sample(t);
        for dx in 0..bar.width {
            put(img, bar.x + dx as i32, bar.y + dy as i32, Rgba(c.to_array()));
        }
    }
    draw_frame(img, bar, BLACK);

    let ticks = nice_ticks(range, 6);
    let step = match ticks.as_slice() {
        [a, b, ..] => b - a,
        _ => range.span(),
    };

    let mut widest = 0;
    for &tick in &ticks {
        let t = range.normalize(tick);
        let y = bar.bottom() - 1 - (t * (h - 1) as f32).round() as i32;
        for dx in 0..5 {
            put(img, bar.right() + dx, y, BLACK);
        }
        let text = format_tick(tick, step);
        let (w, th) = labeler.measure(&text, font_size);
        widest = widest.max(w);
        labeler.draw(img, &text, bar.right() + 8, y - th / 2, font_size, BLACK);
    }

    if !label.is_empty() {
        let x = bar.right() + 8 + widest + 8;
        labeler.draw_vertical(img, label, x, bar.y + bar.height as i32 / 2, font_size, BLACK);
    }
}

/// One-pixel rectangle outline.
pub(crate) fn draw_frame(img: &mut RgbaImage, r: Rect, color: Rgba<u8>) {
    for dx in -1..=r.width as i32 {
        put(img, r.x + dx, r.y - 1, color);
        put(img, r.x + dx, r.bottom(), color);
    }
    for dy in -1..=r.height as i32 {
        put(img, r.x - 1, r.y + dy, color);
        put(img, r.right(), r.y + dy, color);
    }
}

pub(crate) fn put(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Standalone transparent legend: bar, ticks and `"<title> (<unit>)"`.
pub fn render_colorbar(
    title: &str,
    unit: &str,
    colormap: &Colormap,
    range: GlobalRange,
    labeler: &Labeler,
) -> RgbaRaster {
    let mut img = RgbaImage::new(LEGEND_WIDTH, LEGEND_HEIGHT);
    let bar = Rect::new(40, 40, 40, LEGEND_HEIGHT - 80);
    let label = format!("{} ({})", title, unit);
    draw_colorbar(&mut img, bar, colormap, range, labeler, &label, 16.0);
    img.into()
}

/// Render the standalone legend and write it as PNG.
pub fn write_colorbar(
    path: &Path,
    title: &str,
    unit: &str,
    colormap: &Colormap,
    range: GlobalRange,
    labeler: &Labeler,
) -> RasterResult<()> {
    write_png(path, &render_colorbar(title, unit, colormap, range, labeler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_ticks_temperature() {
        let ticks = nice_ticks(GlobalRange::new(270.0, 310.0).unwrap(), 6);
        assert_eq!(ticks, vec![270.0, 280.0, 290.0, 300.0, 310.0]);
    }

    #[test]
    fn test_nice_ticks_inside_range() {
        let range = GlobalRange::new(0.13, 0.87).unwrap();
        let ticks = nice_ticks(range, 6);
        assert!(ticks.len() >= 2 && ticks.len() <= 6);
        assert!(ticks.iter().all(|t| range.contains(*t)));
    }

    #[test]
    fn test_nice_ticks_degenerate() {
        assert_eq!(nice_ticks(GlobalRange::new(3.0, 3.0).unwrap(), 6), vec![3.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(280.0, 10.0), "280");
        assert_eq!(format_tick(0.25, 0.25), "0.25");
        assert_eq!(format_tick(2.5, 2.5), "2.5");
        assert_eq!(format_tick(0.5, 0.1), "0.5");
        assert_eq!(format_tick(-0.0, 0.5), "0.0");
    }

    #[test]
    fn test_legend_without_font_has_bar() {
        let range = GlobalRange::new(0.0, 300.0).unwrap();
        let map = Colormap::builtin("Blues").unwrap();
        let raster = render_colorbar("Total_Precipitation", "mm", &map, range, &Labeler::none());
        assert_eq!(raster.width(), LEGEND_WIDTH as usize);
        assert_eq!(raster.height(), LEGEND_HEIGHT as usize);
        // Background stays transparent, the bar is opaque
        assert_eq!(raster.pixel(5, 5)[3], 0);
        assert_eq!(raster.pixel(60, 400)[3], 255);
        // Top of the bar is the maximum colour
        assert_eq!(raster.pixel(60, 40), map.sample(1.0).to_array());
    }
}
