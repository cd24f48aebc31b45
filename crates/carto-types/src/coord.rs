use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const SCALE: f64 = 1e7;

/// A latitude/longitude pair stored as fixed-point 1e-7 degrees.
///
/// The merge engine treats coordinates as opaque values compared only for
/// equality; fixed-point storage makes that comparison exact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    lat_e7: i32,
    lon_e7: i32,
}

impl Coordinate {
    /// Create a coordinate from degrees, rounding to 1e-7 degrees.
    pub fn from_degrees(lat: f64, lon: f64) -> Result<Self, TypeError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(TypeError::CoordinateOutOfRange { lat, lon });
        }
        Ok(Self {
            lat_e7: (lat * SCALE).round() as i32,
            lon_e7: (lon * SCALE).round() as i32,
        })
    }

    /// Create a coordinate from raw fixed-point values.
    pub const fn from_e7(lat_e7: i32, lon_e7: i32) -> Self {
        Self { lat_e7, lon_e7 }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        f64::from(self.lat_e7) / SCALE
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        f64::from(self.lon_e7) / SCALE
    }

    /// Raw fixed-point latitude.
    pub fn lat_e7(&self) -> i32 {
        self.lat_e7
    }

    /// Raw fixed-point longitude.
    pub fn lon_e7(&self) -> i32 {
        self.lon_e7
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({:.7}, {:.7})", self.lat(), self.lon())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7},{:.7}", self.lat(), self.lon())
    }
}
