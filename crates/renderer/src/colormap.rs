//! Named colour maps.
//!
//! Built-in maps are sampled versions of the matplotlib maps the original
//! figures used (`hot`, `coolwarm`, `Blues`, `Greens`, `Purples`, `Oranges`,
//! `viridis`). A `_r` suffix reverses any of them. Custom maps are built
//! from evenly spaced hex colours.

use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Scale RGB by `factor` in [0, 1], keeping alpha.
    pub fn shade(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f).round() as u8,
            g: (self.g as f32 * f).round() as u8,
            b: (self.b as f32 * f).round() as u8,
            a: self.a,
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Linear interpolation between two colours, `t` clamped to [0, 1].
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// A colour at a normalised position along a colour map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f32,
    pub color: Color,
}

/// Piecewise-linear colour map over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    stops: Vec<ColorStop>,
}

const fn stop(position: f32, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop {
        position,
        color: Color::rgb(r, g, b),
    }
}

const HOT: &[ColorStop] = &[
    stop(0.0, 10, 0, 0),
    stop(0.365, 255, 0, 0),
    stop(0.746, 255, 255, 0),
    stop(1.0, 255, 255, 255),
];

const COOLWARM: &[ColorStop] = &[
    stop(0.0, 59, 76, 192),
    stop(0.25, 141, 176, 254),
    stop(0.5, 221, 221, 221),
    stop(0.75, 244, 154, 123),
    stop(1.0, 180, 4, 38),
];

const BLUES: &[ColorStop] = &[
    stop(0.0, 247, 251, 255),
    stop(0.25, 198, 219, 239),
    stop(0.5, 107, 174, 214),
    stop(0.75, 33, 113, 181),
    stop(1.0, 8, 48, 107),
];

const GREENS: &[ColorStop] = &[
    stop(0.0, 247, 252, 245),
    stop(0.25, 199, 233, 192),
    stop(0.5, 116, 196, 118),
    stop(0.75, 35, 139, 69),
    stop(1.0, 0, 68, 27),
];

const PURPLES: &[ColorStop] = &[
    stop(0.0, 252, 251, 253),
    stop(0.25, 218, 218, 235),
    stop(0.5, 158, 154, 200),
    stop(0.75, 106, 81, 163),
    stop(1.0, 63, 0, 125),
];

const ORANGES: &[ColorStop] = &[
    stop(0.0, 255, 245, 235),
    stop(0.25, 253, 208, 162),
    stop(0.5, 253, 141, 60),
    stop(0.75, 217, 72, 1),
    stop(1.0, 127, 39, 4),
];

const VIRIDIS: &[ColorStop] = &[
    stop(0.0, 68, 1, 84),
    stop(0.25, 59, 82, 139),
    stop(0.5, 33, 145, 140),
    stop(0.75, 94, 201, 98),
    stop(1.0, 253, 231, 37),
];

impl Colormap {
    /// Build from explicit stops. Stops are sorted by position; at least one
    /// is required.
    pub fn new(name: impl Into<String>, mut stops: Vec<ColorStop>) -> Option<Self> {
        if stops.is_empty() || stops.iter().any(|s| !s.position.is_finite()) {
            return None;
        }
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Some(Self {
            name: name.into(),
            stops,
        })
    }

    /// Evenly spaced hex colours, e.g. `["#ffffff", "#ff0000"]`.
    pub fn from_hex(name: impl Into<String>, colors: &[String]) -> Result<Self, String> {
        let name = name.into();
        if colors.len() < 2 {
            return Err(format!("colour map '{}' needs at least two colours", name));
        }
        let last = (colors.len() - 1) as f32;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, hex)| {
                hex_to_rgb(hex)
                    .map(|(r, g, b)| stop(i as f32 / last, r, g, b))
                    .ok_or_else(|| format!("invalid colour '{}' in map '{}'", hex, name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, stops).ok_or_else(|| "empty colour map".to_string())
    }

    /// Look up a built-in map. Names are case-insensitive; `_r` reverses.
    pub fn builtin(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let stops = match base {
            "hot" => HOT,
            "coolwarm" => COOLWARM,
            "blues" => BLUES,
            "greens" => GREENS,
            "purples" => PURPLES,
            "oranges" => ORANGES,
            "viridis" => VIRIDIS,
            _ => return None,
        };
        let map = Self {
            name: name.to_string(),
            stops: stops.to_vec(),
        };
        Some(if reversed { map.reversed() } else { map })
    }

    /// Names of all built-in maps.
    pub fn builtin_names() -> &'static [&'static str] {
        &["hot", "coolwarm", "Blues", "Greens", "Purples", "Oranges", "viridis"]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Same map traversed from 1 to 0.
    pub fn reversed(&self) -> Self {
        let stops = self
            .stops
            .iter()
            .rev()
            .map(|s| ColorStop {
                position: 1.0 - s.position,
                color: s.color,
            })
            .collect();
        Self {
            name: self.name.clone(),
            stops,
        }
    }

    /// Colour at normalised position `t`, clamped to [0, 1].
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let first = self.stops[0];
        if t <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.position {
                let span = hi.position - lo.position;
                if span <= 0.0 {
                    return hi.color;
                }
                return interpolate_color(lo.color, hi.color, (t - lo.position) / span);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// 256-entry lookup table, index `i` holding `sample(i / 255)`.
    pub fn lut(&self) -> [Color; 256] {
        let mut lut = [Color::transparent(); 256];
        for (i, c) in lut.iter_mut().enumerate() {
            *c = self.sample(i as f32 / 255.0);
        }
        lut
    }
}
