use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    ValidationError,
    validation_error::{BlankMmsiSnafu, LatitudeRangeSnafu, LongitudeRangeSnafu, NonFiniteSnafu},
};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Vessel identity, unique per vessel for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Mmsi(String);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A validated position report for a single vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselPosition {
    pub mmsi: Mmsi,
    pub position: GeoPoint,
    pub speed_knots: Option<f64>,
    pub course_degrees: Option<f64>,
    pub heading_degrees: f64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub vessel_type: Option<String>,
    pub destination: Option<String>,
    pub source: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl Mmsi {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Mmsi {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ensure!(!s.is_empty(), BlankMmsiSnafu);
        Ok(Self(s.to_owned()))
    }
}

impl AsRef<str> for Mmsi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite and out of range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        ensure!(
            latitude.is_finite(),
            NonFiniteSnafu {
                field: "latitude",
                value: latitude
            }
        );
        ensure!(
            longitude.is_finite(),
            NonFiniteSnafu {
                field: "longitude",
                value: longitude
            }
        );
        ensure!(
            (MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude),
            LatitudeRangeSnafu { value: latitude }
        );
        ensure!(
            (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude),
            LongitudeRangeSnafu { value: longitude }
        );

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The point `fraction` of the way from `self` to `to`, on a straight lat/lon line.
    pub fn towards(&self, to: &GeoPoint, fraction: f64) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude + (to.latitude - self.latitude) * fraction,
            longitude: self.longitude + (to.longitude - self.longitude) * fraction,
        }
    }
}
