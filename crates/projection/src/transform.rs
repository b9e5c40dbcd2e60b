//! Point transforms between two supported CRSs.

use raster_common::Crs;
use thiserror::Error;

use crate::mercator::WebMercator;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(Crs),

    #[error("Cannot transform between {from} and {to}")]
    Incompatible { from: Crs, to: Crs },
}

/// A supported projection, resolved from an EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude in degrees
    Geographic,
    /// Spherical Mercator in meters
    WebMercator,
}

impl Projection {
    pub fn from_crs(crs: Crs) -> Result<Self, ProjectionError> {
        match crs.epsg() {
            Some(4326) | Some(4269) | Some(4258) => Ok(Projection::Geographic),
            Some(3857) | Some(3785) => Ok(Projection::WebMercator),
            _ => Err(ProjectionError::UnsupportedCrs(crs)),
        }
    }

    fn to_lon_lat(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => Some((x, y)),
            Projection::WebMercator => WebMercator.inverse(x, y),
        }
    }

    fn from_lon_lat(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => Some((lon, lat)),
            Projection::WebMercator => WebMercator.forward(lon, lat),
        }
    }
}

/// Transform from one CRS to another.
#[derive(Debug, Clone, Copy)]
pub struct CoordTransform {
    steps: Option<(Projection, Projection)>,
}

impl CoordTransform {
    /// Resolve a transform from `from` to `to`.
    ///
    /// Identical CRSs (including two unspecified ones) give the identity
    /// transform; an unspecified CRS paired with a declared one cannot be
    /// resolved.
    pub fn new(from: Crs, to: Crs) -> Result<Self, ProjectionError> {
        if from == to {
            return Ok(Self { steps: None });
        }
        if from == Crs::Unspecified || to == Crs::Unspecified {
            return Err(ProjectionError::Incompatible { from, to });
        }
        let src = Projection::from_crs(from)?;
        let dst = Projection::from_crs(to)?;
        if src == dst {
            return Ok(Self { steps: None });
        }
        Ok(Self {
            steps: Some((src, dst)),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_none()
    }

    /// Transform one point. `None` if it falls outside the target's domain.
    pub fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self.steps {
            None => Some((x, y)),
            Some((src, dst)) => {
                let (lon, lat) = src.to_lon_lat(x, y)?;
                dst.from_lon_lat(lon, lat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = CoordTransform::new(Crs::WGS84, Crs::WGS84).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.transform(24.0, 35.0), Some((24.0, 35.0)));

        let t = CoordTransform::new(Crs::Unspecified, Crs::Unspecified).unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn test_equivalent_geographic_codes_are_identity() {
        let t = CoordTransform::new(Crs::Epsg(4269), Crs::WGS84).unwrap();
        assert!(t.is_identity());
    }

    #[test]
    fn test_geographic_to_mercator_roundtrip() {
        let fwd = CoordTransform::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
        let inv = CoordTransform::new(Crs::WEB_MERCATOR, Crs::WGS84).unwrap();
        let (x, y) = fwd.transform(25.0, 35.0).unwrap();
        let (lon, lat) = inv.transform(x, y).unwrap();
        assert!((lon - 25.0).abs() < 1e-9);
        assert!((lat - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_unspecified_against_declared_fails() {
        assert!(matches!(
            CoordTransform::new(Crs::Unspecified, Crs::WGS84),
            Err(ProjectionError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_unknown_epsg_fails() {
        assert!(matches!(
            CoordTransform::new(Crs::Epsg(2100), Crs::WGS84),
            Err(ProjectionError::UnsupportedCrs(_))
        ));
    }
}
