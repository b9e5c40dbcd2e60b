//! Static per-year plot: title, colour-mapped image and a colour bar.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use raster_common::{GlobalRange, RasterResult};
use tracing::debug;

use crate::colorbar::{draw_colorbar, Rect};
use crate::colormap::Colormap;
use crate::gradient::{colorize, RgbaRaster};
use crate::png::write_png;
use crate::text::{Labeler, BLACK};

/// Figure layout in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotLayout {
    pub width: u32,
    pub height: u32,
    pub title_size: f32,
    pub label_size: f32,
}

impl Default for PlotLayout {
    /// 10x6 inch figure at 100 dpi.
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title_size: 22.0,
            label_size: 15.0,
        }
    }
}

/// What goes on one plot.
#[derive(Debug, Clone, Copy)]
pub struct PlotRequest<'a> {
    pub data: &'a [f32],
    pub width: usize,
    pub height: usize,
    pub range: GlobalRange,
    pub colormap: &'a Colormap,
    pub title: &'a str,
    pub unit: &'a str,
}

const MARGIN_TOP: u32 = 60;
const MARGIN: u32 = 30;
const COLORBAR_GAP: u32 = 30;
const COLORBAR_WIDTH: u32 = 25;
/// Room right of the bar for tick labels and the unit label.
const COLORBAR_TEXT: u32 = 110;

/// Render a plot on a white background.
///
/// The data keeps its aspect ratio and is centred in the axes area; no-data
/// cells show the background. The colour bar spans the image height.
pub fn render_plot(req: &PlotRequest<'_>, layout: &PlotLayout, labeler: &Labeler) -> RgbaRaster {
    let mut img = RgbaImage::from_pixel(layout.width, layout.height, Rgba([255, 255, 255, 255]));

    labeler.draw_centered(
        &mut img,
        req.title,
        layout.width as i32 / 2,
        (MARGIN_TOP as i32 - layout.title_size as i32) / 2,
        layout.title_size,
        BLACK,
    );

    let axes_w = layout
        .width
        .saturating_sub(2 * MARGIN + COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_TEXT);
    let axes_h = layout.height.saturating_sub(MARGIN_TOP + MARGIN);

    let image_rect = fit(req.width as u32, req.height as u32, axes_w, axes_h);
    let image_rect = Rect::new(
        MARGIN as i32 + image_rect.x,
        MARGIN_TOP as i32 + image_rect.y,
        image_rect.width,
        image_rect.height,
    );

    if image_rect.width > 0 && image_rect.height > 0 {
        let colored = colorize(req.data, req.width, req.height, req.range, req.colormap).to_image();
        let scaled = imageops::resize(
            &colored,
            image_rect.width,
            image_rect.height,
            FilterType::Nearest,
        );
        imageops::overlay(&mut img, &scaled, image_rect.x as i64, image_rect.y as i64);
    }

    let bar = Rect::new(
        image_rect.right() + COLORBAR_GAP as i32,
        image_rect.y,
        COLORBAR_WIDTH,
        image_rect.height.max(1),
    );
    let label = format!("Unit: {}", req.unit);
    draw_colorbar(&mut img, bar, req.colormap, req.range, labeler, &label, layout.label_size);

    img.into()
}

/// Largest rectangle with the aspect of `w`x`h` centred in `max_w`x`max_h`.
fn fit(w: u32, h: u32, max_w: u32, max_h: u32) -> Rect {
    if w == 0 || h == 0 || max_w == 0 || max_h == 0 {
        return Rect::new(0, 0, 0, 0);
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let fw = ((w as f64 * scale).round() as u32).clamp(1, max_w);
    let fh = ((h as f64 * scale).round() as u32).clamp(1, max_h);
    Rect::new(
        ((max_w - fw) / 2) as i32,
        ((max_h - fh) / 2) as i32,
        fw,
        fh,
    )
}

/// Render a plot and write it as PNG.
pub fn write_plot(
    path: &Path,
    req: &PlotRequest<'_>,
    layout: &PlotLayout,
    labeler: &Labeler,
) -> RasterResult<()> {
    let raster = render_plot(req, layout, labeler);
    write_png(path, &raster)?;
    debug!(path = %path.display(), title = req.title, "Wrote plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect() {
        let r = fit(35, 10, 700, 500);
        assert_eq!(r.width, 700);
        assert_eq!(r.height, 200);
        assert_eq!(r.y, 150);

        let r = fit(10, 10, 700, 500);
        assert_eq!((r.width, r.height), (500, 500));
        assert_eq!(r.x, 100);
    }

    #[test]
    fn test_plot_size_and_background() {
        let data: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let range = GlobalRange::new(0.0, 19.0).unwrap();
        let map = Colormap::builtin("hot").unwrap();
        let req = PlotRequest {
            data: &data,
            width: 5,
            height: 4,
            range,
            colormap: &map,
            title: "Temperature_2m Data for 1990",
            unit: "K",
        };
        let layout = PlotLayout::default();
        let raster = render_plot(&req, &layout, &Labeler::none());
        assert_eq!(raster.width(), 1000);
        assert_eq!(raster.height(), 600);
        // Figure is opaque everywhere
        assert!(raster.alpha().all(|a| a == 255));
        assert_eq!(raster.pixel(2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn test_nodata_shows_background() {
        let data = vec![f32::NAN; 4];
        let range = GlobalRange::new(0.0, 1.0).unwrap();
        let map = Colormap::builtin("Greens").unwrap();
        let req = PlotRequest {
            data: &data,
            width: 2,
            height: 2,
            range,
            colormap: &map,
            title: "",
            unit: "m³/m³",
        };
        let raster = render_plot(&req, &PlotLayout::default(), &Labeler::none());
        // Centre of the axes area
        assert_eq!(raster.pixel(417, 300), [255, 255, 255, 255]);
    }
}
