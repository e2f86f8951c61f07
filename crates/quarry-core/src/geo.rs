//! Distance units, angle conventions, and point resolution.
//!
//! The index server measures `@geodist` in meters. [`DistanceUnit`] converts
//! user-facing distances into meters; [`ToLatLng`] turns the many shapes a
//! "point" can take into a [`LatLng`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ============================================================================
// DistanceUnit
// ============================================================================

/// A unit a geo distance can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Meters (the index server's native unit).
    #[default]
    Meters,
    /// Kilometers.
    Kilometers,
    /// International feet.
    Feet,
    /// Statute miles.
    Miles,
    /// International yards.
    Yards,
}

impl DistanceUnit {
    /// Every supported unit.
    pub const ALL: [DistanceUnit; 5] = [
        DistanceUnit::Meters,
        DistanceUnit::Kilometers,
        DistanceUnit::Feet,
        DistanceUnit::Miles,
        DistanceUnit::Yards,
    ];

    /// Meters per one of this unit.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Feet => 0.3048,
            DistanceUnit::Miles => 1609.344,
            DistanceUnit::Yards => 0.9144,
        }
    }

    /// Convert a distance in this unit to meters.
    pub fn to_meters(&self, distance: f64) -> f64 {
        distance * self.meters_per_unit()
    }

    /// Convert a distance in meters to this unit.
    pub fn from_meters(&self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    /// Name used when parsing.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Feet => "feet",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Yards => "yards",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meters" | "meter" | "m" => Ok(DistanceUnit::Meters),
            "kilometers" | "kilometer" | "km" => Ok(DistanceUnit::Kilometers),
            "feet" | "foot" | "ft" => Ok(DistanceUnit::Feet),
            "miles" | "mile" | "mi" => Ok(DistanceUnit::Miles),
            "yards" | "yard" | "yd" => Ok(DistanceUnit::Yards),
            _ => Err(Error::InvalidUnits {
                unit: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// AngleUnit
// ============================================================================

/// Angle convention the index server expects for geo-anchor coordinates.
///
/// Points are always supplied in degrees; this decides what is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    /// Send degrees unchanged.
    #[default]
    Degrees,
    /// Convert degrees to radians before sending.
    Radians,
}

impl AngleUnit {
    /// Convert an angle given in degrees into this unit.
    pub fn from_degrees(&self, degrees: f64) -> f64 {
        match self {
            AngleUnit::Degrees => degrees,
            AngleUnit::Radians => degrees.to_radians(),
        }
    }
}

// ============================================================================
// LatLng / ToLatLng
// ============================================================================

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Create a point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// This point expressed in the given angle convention.
    pub fn in_units(&self, units: AngleUnit) -> (f64, f64) {
        (units.from_degrees(self.lat), units.from_degrees(self.lng))
    }
}

/// Anything that can be resolved to a [`LatLng`].
///
/// Implemented for raw `(lat, lng)` pairs, [`LatLng`] itself, and JSON
/// values that carry `lat`/`lng` directly or under a `coordinates` or
/// `point` member. Domain types implement it to expose their location.
pub trait ToLatLng {
    /// Resolve the point or fail with [`Error::InvalidPoint`].
    fn to_lat_lng(&self) -> Result<LatLng>;
}

impl ToLatLng for LatLng {
    fn to_lat_lng(&self) -> Result<LatLng> {
        Ok(*self)
    }
}

impl ToLatLng for (f64, f64) {
    fn to_lat_lng(&self) -> Result<LatLng> {
        Ok(LatLng::new(self.0, self.1))
    }
}

impl ToLatLng for Value {
    fn to_lat_lng(&self) -> Result<LatLng> {
        direct_lat_lng(self)
            .or_else(|| self.get("coordinates").and_then(direct_lat_lng))
            .or_else(|| self.get("point").and_then(direct_lat_lng))
            .ok_or_else(|| Error::InvalidPoint {
                input: self.to_string(),
            })
    }
}

impl<T: ToLatLng + ?Sized> ToLatLng for &T {
    fn to_lat_lng(&self) -> Result<LatLng> {
        (**self).to_lat_lng()
    }
}

fn direct_lat_lng(value: &Value) -> Option<LatLng> {
    let lat = value.get("lat").or_else(|| value.get("latitude"))?.as_f64()?;
    let lng = value
        .get("lng")
        .or_else(|| value.get("lon"))
        .or_else(|| value.get("longitude"))?
        .as_f64()?;
    Some(LatLng::new(lat, lng))
}

// ============================================================================
// Tests
// ============================================================================
