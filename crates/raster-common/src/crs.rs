//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CRS attached to a raster, as declared by its GeoTIFF keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// An EPSG code (e.g. 4326 for WGS84, 3857 for Web Mercator)
    Epsg(u16),
    /// The file carries no usable CRS information
    Unspecified,
}

impl Crs {
    pub const WGS84: Crs = Crs::Epsg(4326);
    pub const WEB_MERCATOR: Crs = Crs::Epsg(3857);

    /// Parse strings like `EPSG:4326` or `epsg:3857`.
    pub fn from_epsg_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::InvalidFormat(s.to_string()))?;
        code.parse::<u16>()
            .map(Crs::Epsg)
            .map_err(|_| CrsParseError::InvalidFormat(s.to_string()))
    }

    /// EPSG code, if any.
    pub fn epsg(&self) -> Option<u16> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Unspecified => None,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Epsg(4326) | Crs::Epsg(4269) | Crs::Epsg(4258))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Unspecified => write!(f, "unspecified"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Invalid CRS '{0}', expected 'EPSG:<code>'")]
    InvalidFormat(String),
}
