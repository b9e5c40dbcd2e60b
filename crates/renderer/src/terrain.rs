//! Band values draped over the reference elevation, seen from a fixed camera.
//!
//! The mesh is the reference grid's pixel centres lifted by
//! `elevation * warp_factor`. Cells are projected orthographically, sorted
//! far to near and filled with flat, diffusely shaded colour (painter's
//! algorithm). Behind the mesh, the three faces of its bounding box that
//! point away from the camera carry a grid at the axis ticks, with tick
//! labels on the outer edges. A colour bar sits to the right.

use std::path::Path;

use image::RgbaImage;
use nalgebra::{Point3, Rotation3, Vector3};
use raster_common::{GlobalRange, RasterError, RasterResult};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

use crate::colorbar::{draw_colorbar, format_tick, nice_ticks, Rect};
use crate::colormap::Colormap;
use crate::gradient::RgbaRaster;
use crate::png::write_png;
use crate::text::{Labeler, BLACK};

/// Camera and figure settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainView {
    /// Degrees counter-clockwise from +x (east), seen from above
    pub azimuth_deg: f64,
    /// Degrees above the horizon
    pub elevation_deg: f64,
    /// Vertical exaggeration applied to elevation before projection
    pub warp_factor: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for TerrainView {
    fn default() -> Self {
        Self {
            azimuth_deg: 320.0,
            elevation_deg: 20.0,
            warp_factor: 0.00005,
            width: 1200,
            height: 800,
        }
    }
}

/// Mesh and values for one terrain rendering.
#[derive(Debug, Clone, Copy)]
pub struct TerrainRequest<'a> {
    /// Pixel-centre x coordinates of the reference grid, row-major
    pub xs: &'a [f64],
    /// Pixel-centre y coordinates of the reference grid, row-major
    pub ys: &'a [f64],
    /// Reference elevation, NaN where unknown
    pub elevation: &'a [f32],
    /// Band values aligned to the reference grid
    pub values: &'a [f32],
    pub width: usize,
    pub height: usize,
    pub range: GlobalRange,
    pub colormap: &'a Colormap,
    pub title: &'a str,
    /// Colour bar label, e.g. `Temperature_2m (K)`
    pub legend: &'a str,
}

const MARGIN: f32 = 40.0;
const TITLE_BAND: f32 = 50.0;
const LEGEND_SPACE: u32 = 170;
const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const GRID: [u8; 4] = [128, 128, 128, 255];
const TICK_FONT: f32 = 11.0;
const MAX_AXIS_TICKS: usize = 5;

/// One projected grid cell.
struct Face {
    corners: [(f64, f64); 4],
    depth: f64,
    color: crate::colormap::Color,
}

/// Render a terrain view. Fails only if the canvas cannot be allocated or
/// the request arrays do not match the grid shape.
pub fn render_terrain(
    req: &TerrainRequest<'_>,
    view: &TerrainView,
    labeler: &Labeler,
) -> RasterResult<RgbaRaster> {
    let n = req.width * req.height;
    if req.xs.len() != n || req.ys.len() != n || req.elevation.len() != n || req.values.len() != n {
        return Err(RasterError::render(format!(
            "terrain arrays do not match the {}x{} grid",
            req.width, req.height
        )));
    }

    let rotation = camera(view);
    let eye = eye_direction(view);
    let light = (eye + Vector3::z()).normalize();

    let (cx, cy) = centre(req.xs, req.ys);
    let vertex = |i: usize| -> Option<Point3<f64>> {
        let z = req.elevation[i];
        z.is_finite()
            .then(|| Point3::new(req.xs[i] - cx, req.ys[i] - cy, z as f64 * view.warp_factor))
    };

    // Build faces in world space, then project
    let mut faces = Vec::new();
    let mut extent = Extent::empty();
    for row in 0..req.height.saturating_sub(1) {
        for col in 0..req.width.saturating_sub(1) {
            let idx = [
                row * req.width + col,
                row * req.width + col + 1,
                (row + 1) * req.width + col + 1,
                (row + 1) * req.width + col,
            ];
            let (Some(p0), Some(p1), Some(p2), Some(p3)) =
                (vertex(idx[0]), vertex(idx[1]), vertex(idx[2]), vertex(idx[3]))
            else {
                continue;
            };

            let valid: Vec<f32> = idx
                .iter()
                .map(|&i| req.values[i])
                .filter(|v| v.is_finite())
                .collect();
            if valid.is_empty() {
                continue;
            }
            let value = valid.iter().sum::<f32>() / valid.len() as f32;

            let normal = (p1 - p0).cross(&(p3 - p0));
            let shade = match normal.try_normalize(1e-12) {
                Some(n) => 0.6 + 0.4 * n.dot(&light).abs(),
                None => 1.0,
            };
            let color = req.colormap.sample(req.range.normalize(value)).shade(shade as f32);

            for p in [&p0, &p1, &p2, &p3] {
                extent.include(p);
            }
            let projected = [p0, p1, p2, p3].map(|p| rotation * p);
            let depth = projected.iter().map(|p| p.z).sum::<f64>() / 4.0;
            faces.push(Face {
                corners: projected.map(|p| (p.x, p.y)),
                depth,
                color,
            });
        }
    }

    // Nothing drawn, nothing to frame
    let frame = (!faces.is_empty()).then(|| bounds_frame(&extent, &eye, (cx, cy), view.warp_factor));

    let mut pixmap = Pixmap::new(view.width, view.height)
        .ok_or_else(|| RasterError::render("cannot allocate terrain canvas"))?;
    pixmap.fill(tiny_skia::Color::from_rgba8(
        BACKGROUND[0],
        BACKGROUND[1],
        BACKGROUND[2],
        BACKGROUND[3],
    ));

    // Far first: the camera looks down -z, so smaller z is farther
    faces.sort_by(|a, b| a.depth.total_cmp(&b.depth));

    let plot_w = view.width.saturating_sub(LEGEND_SPACE) as f32 - 2.0 * MARGIN;
    let plot_h = view.height as f32 - 2.0 * MARGIN - TITLE_BAND;
    let box_corners = frame.as_ref().map(|_| extent.corners().map(|p| rotation * p));
    let to_screen = screen_mapping(
        faces
            .iter()
            .flat_map(|f| f.corners.iter().copied())
            .chain(box_corners.iter().flatten().map(|p| (p.x, p.y))),
        plot_w.max(1.0),
        plot_h.max(1.0),
    );
    let project = |p: &Point3<f64>| {
        let v = rotation * *p;
        to_screen(v.x, v.y)
    };

    let mut paint = Paint::default();
    paint.anti_alias = false;

    // The frame lies behind every cell
    if let Some(frame) = &frame {
        paint.set_color_rgba8(GRID[0], GRID[1], GRID[2], GRID[3]);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        for (a, b) in &frame.lines {
            let ((ax, ay), (bx, by)) = (project(a), project(b));
            let mut pb = PathBuilder::new();
            pb.move_to(ax, ay);
            pb.line_to(bx, by);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    for face in &faces {
        paint.set_color_rgba8(face.color.r, face.color.g, face.color.b, 255);
        let mut pb = PathBuilder::new();
        for (i, &(x, y)) in face.corners.iter().enumerate() {
            let (sx, sy) = to_screen(x, y);
            if i == 0 {
                pb.move_to(sx, sy);
            } else {
                pb.line_to(sx, sy);
            }
        }
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    debug!(faces = faces.len(), "Rasterised terrain mesh");

    // Opaque throughout, so premultiplied bytes equal straight RGBA
    let mut img = RgbaImage::from_raw(view.width, view.height, pixmap.take())
        .ok_or_else(|| RasterError::render("terrain canvas size mismatch"))?;

    if let Some(frame) = &frame {
        for label in &frame.labels {
            let (sx, sy) = project(&label.anchor);
            let (w, h) = labeler.measure(&label.text, TICK_FONT);
            let (x, y) = match label.axis {
                Axis::X | Axis::Y => (sx as i32 - w / 2, sy as i32 + 4),
                Axis::Z => (sx as i32 - w - 6, sy as i32 - h / 2),
            };
            labeler.draw(&mut img, &label.text, x, y, TICK_FONT, BLACK);
        }
    }

    labeler.draw_centered(
        &mut img,
        req.title,
        view.width as i32 / 2,
        (MARGIN / 2.0) as i32,
        22.0,
        BLACK,
    );

    let bar_h = (view.height as f32 * 0.6) as u32;
    let bar = Rect::new(
        view.width.saturating_sub(LEGEND_SPACE) as i32 + 10,
        ((view.height - bar_h) / 2) as i32,
        22,
        bar_h,
    );
    draw_colorbar(&mut img, bar, req.colormap, req.range, labeler, req.legend, 15.0);

    Ok(img.into())
}

/// Render a terrain view and write it as PNG.
pub fn write_terrain(
    path: &Path,
    req: &TerrainRequest<'_>,
    view: &TerrainView,
    labeler: &Labeler,
) -> RasterResult<()> {
    let raster = render_terrain(req, view, labeler)?;
    write_png(path, &raster)
}

/// Unit vector from the scene towards the camera.
fn eye_direction(view: &TerrainView) -> Vector3<f64> {
    let az = view.azimuth_deg.to_radians();
    let el = view.elevation_deg.to_radians();
    Vector3::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin())
}

/// World-to-view rotation: view x to the right, y up, camera looking at -z.
fn camera(view: &TerrainView) -> Rotation3<f64> {
    let dir = -eye_direction(view);
    let up = if dir.cross(&Vector3::z()).norm() < 1e-9 {
        Vector3::y()
    } else {
        Vector3::z()
    };
    Rotation3::look_at_rh(&dir, &up)
}

fn centre(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let finite = |v: &&f64| v.is_finite();
    let (xmin, xmax) = xs
        .iter()
        .filter(finite)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| (a.min(*v), b.max(*v)));
    let (ymin, ymax) = ys
        .iter()
        .filter(finite)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| (a.min(*v), b.max(*v)));
    if xmin > xmax || ymin > ymax {
        return (0.0, 0.0);
    }
    ((xmin + xmax) / 2.0, (ymin + ymax) / 2.0)
}

/// Map view-plane coordinates into the plot area, keeping aspect and
/// flipping y so up is up. `points` is everything that has to fit.
fn screen_mapping(
    points: impl Iterator<Item = (f64, f64)>,
    plot_w: f32,
    plot_h: f32,
) -> impl Fn(f64, f64) -> (f32, f32) {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in points {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    let span_x = (max.0 - min.0).max(1e-12);
    let span_y = (max.1 - min.1).max(1e-12);
    let scale = (plot_w as f64 / span_x).min(plot_h as f64 / span_y);
    let off_x = MARGIN as f64 + (plot_w as f64 - span_x * scale) / 2.0;
    let off_y = (MARGIN + TITLE_BAND) as f64 + (plot_h as f64 - span_y * scale) / 2.0;

    move |x, y| {
        (
            (off_x + (x - min.0) * scale) as f32,
            (off_y + (max.1 - y) * scale) as f32,
        )
    }
}

/// Bounding box of the drawn cells in centred, warped world coordinates.
#[derive(Debug, Clone, Copy)]
struct Extent {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Extent {
    fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    fn include(&mut self, p: &Point3<f64>) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    fn corners(&self) -> [Point3<f64>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone)]
struct TickLabel {
    axis: Axis,
    anchor: Point3<f64>,
    text: String,
}

/// Grid segments and tick labels, all in world coordinates.
#[derive(Debug, Clone, Default)]
struct BoundsFrame {
    lines: Vec<(Point3<f64>, Point3<f64>)>,
    labels: Vec<TickLabel>,
}

/// Ticks over `[lo, hi]` as (value, label) pairs.
fn axis_ticks(lo: f64, hi: f64) -> Vec<(f64, String)> {
    let Some(range) = GlobalRange::new(lo as f32, hi as f32) else {
        return Vec::new();
    };
    let ticks = nice_ticks(range, MAX_AXIS_TICKS);
    let step = match ticks.as_slice() {
        [a, b, ..] => b - a,
        _ => range.span(),
    };
    ticks
        .into_iter()
        .map(|t| (t as f64, format_tick(t, step)))
        .collect()
}

/// The floor and the two walls of `extent` facing away from `eye`, gridded
/// at the x/y ticks (CRS units) and z ticks (unwarped elevation). Labels sit
/// on the edges nearest the viewer.
fn bounds_frame(extent: &Extent, eye: &Vector3<f64>, (cx, cy): (f64, f64), warp: f64) -> BoundsFrame {
    let (lo, hi) = (extent.min, extent.max);
    let (back_x, front_x) = if eye.x > 0.0 { (lo.x, hi.x) } else { (hi.x, lo.x) };
    let (back_y, front_y) = if eye.y > 0.0 { (lo.y, hi.y) } else { (hi.y, lo.y) };
    let (floor, top) = (lo.z, hi.z);
    let has_walls = top > floor;

    let mut frame = BoundsFrame::default();
    let mut line = |a: Point3<f64>, b: Point3<f64>| frame.lines.push((a, b));

    // Outline of the floor and walls
    line(Point3::new(lo.x, lo.y, floor), Point3::new(hi.x, lo.y, floor));
    line(Point3::new(lo.x, hi.y, floor), Point3::new(hi.x, hi.y, floor));
    line(Point3::new(lo.x, lo.y, floor), Point3::new(lo.x, hi.y, floor));
    line(Point3::new(hi.x, lo.y, floor), Point3::new(hi.x, hi.y, floor));
    if has_walls {
        line(Point3::new(back_x, lo.y, top), Point3::new(back_x, hi.y, top));
        line(Point3::new(lo.x, back_y, top), Point3::new(hi.x, back_y, top));
        line(Point3::new(back_x, back_y, floor), Point3::new(back_x, back_y, top));
        line(Point3::new(back_x, front_y, floor), Point3::new(back_x, front_y, top));
        line(Point3::new(front_x, back_y, floor), Point3::new(front_x, back_y, top));
    }

    for (v, text) in axis_ticks(lo.x + cx, hi.x + cx) {
        let x = v - cx;
        line(Point3::new(x, lo.y, floor), Point3::new(x, hi.y, floor));
        if has_walls {
            line(Point3::new(x, back_y, floor), Point3::new(x, back_y, top));
        }
        frame.labels.push(TickLabel {
            axis: Axis::X,
            anchor: Point3::new(x, front_y, floor),
            text,
        });
    }
    for (v, text) in axis_ticks(lo.y + cy, hi.y + cy) {
        let y = v - cy;
        line(Point3::new(lo.x, y, floor), Point3::new(hi.x, y, floor));
        if has_walls {
            line(Point3::new(back_x, y, floor), Point3::new(back_x, y, top));
        }
        frame.labels.push(TickLabel {
            axis: Axis::Y,
            anchor: Point3::new(front_x, y, floor),
            text,
        });
    }
    if has_walls && warp > 0.0 {
        for (v, text) in axis_ticks(floor / warp, top / warp) {
            let z = v * warp;
            line(Point3::new(back_x, lo.y, z), Point3::new(back_x, hi.y, z));
            line(Point3::new(lo.x, back_y, z), Point3::new(hi.x, back_y, z));
            frame.labels.push(TickLabel {
                axis: Axis::Z,
                anchor: Point3::new(back_x, front_y, z),
                text,
            });
        }
    }
    frame
}
