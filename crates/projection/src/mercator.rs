//! Spherical (Web) Mercator projection, EPSG:3857.
//!
//! Uses the WGS84 semi-major axis as sphere radius, the way web maps do.
//! Latitudes are limited to ±85.0511° where the projected square closes.

use std::f64::consts::PI;

/// WGS84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit where Web Mercator y reaches ±20037508.34 m.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Geographic (lon, lat) in degrees to projected (x, y) in meters.
    ///
    /// Returns `None` beyond the latitude limit.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() || lat_deg.abs() > MAX_LATITUDE {
            return None;
        }
        let to_rad = PI / 180.0;
        let x = EARTH_RADIUS * lon_deg * to_rad;
        let y = EARTH_RADIUS * (PI / 4.0 + lat_deg * to_rad / 2.0).tan().ln();
        Some((x, y))
    }

    /// Projected (x, y) in meters to geographic (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let to_deg = 180.0 / PI;
        let lon = x / EARTH_RADIUS * to_deg;
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0) * to_deg;
        Some((lon, lat))
    }
}
