use serde::Serialize;
use snafu::ensure;

use crate::{
    BoundsError, GeoPoint, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
    bounds_error::{LatitudeBoundsSnafu, LongitudeBoundsSnafu, NonFiniteBoundsSnafu},
};

/// The rectangular lat/lon region currently visible on the map.
///
/// Serializes to the `min_lat`, `max_lat`, `min_lon`, `max_lon` query parameters the
/// snapshot endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl Bounds {
    pub fn new(
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Self, BoundsError> {
        ensure!(
            [min_lat, max_lat, min_lon, max_lon]
                .iter()
                .all(|v| v.is_finite()),
            NonFiniteBoundsSnafu
        );
        ensure!(
            MIN_LATITUDE <= min_lat && min_lat <= max_lat && max_lat <= MAX_LATITUDE,
            LatitudeBoundsSnafu {
                min: min_lat,
                max: max_lat
            }
        );
        ensure!(
            MIN_LONGITUDE <= min_lon && min_lon <= max_lon && max_lon <= MAX_LONGITUDE,
            LongitudeBoundsSnafu {
                min: min_lon,
                max: max_lon
            }
        );

        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Builds bounds from the edges a map surface reports for its viewport.
    ///
    /// Map surfaces happily report longitudes past +-180 after the user wraps around the
    /// globe, and edges in any order, so the values are ordered and clamped instead of
    /// rejected.
    pub fn from_viewport(
        south: f64,
        north: f64,
        west: f64,
        east: f64,
    ) -> Result<Self, BoundsError> {
        ensure!(
            [south, north, west, east].iter().all(|v| v.is_finite()),
            NonFiniteBoundsSnafu
        );

        let clamp_lat = |v: f64| v.clamp(MIN_LATITUDE, MAX_LATITUDE);
        let clamp_lon = |v: f64| v.clamp(MIN_LONGITUDE, MAX_LONGITUDE);

        Self::new(
            clamp_lat(south.min(north)),
            clamp_lat(south.max(north)),
            clamp_lon(west.min(east)),
            clamp_lon(west.max(east)),
        )
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}
