use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use snafu::{OptionExt, ResultExt};
use tracing::{debug, warn};
use tracking_core::{
    Bounds, GeoPoint, Mmsi, ValidationError, VesselPosition,
    validation_error::{MalformedSnafu, MissingSnafu},
};

/// Response envelope of the snapshot endpoint.
#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    #[serde(default)]
    pub data: Option<SnapshotData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SnapshotData {
    /// Some deployments return the records directly instead of wrapping them.
    Records(Vec<Value>),
    Listing {
        #[serde(default)]
        vessels: Option<Vec<Value>>,
        #[serde(default)]
        source: Option<String>,
    },
}

/// A vessel record as it arrives on the wire, before validation.
///
/// Coordinates and kinematics are accepted both as numbers and as numeric strings, and the
/// snake_case names the backend uses are accepted next to the camelCase ones.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVesselPosition {
    #[serde(default)]
    pub mmsi: Option<RawMmsi>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default, alias = "speed")]
    pub speed_knots: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default, alias = "course")]
    pub course_degrees: Option<f64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default, alias = "heading")]
    pub heading_degrees: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "vessel_type")]
    pub vessel_type: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub observed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMmsi {
    Text(String),
    Number(u64),
}

impl SnapshotResponse {
    pub fn into_records(self) -> Vec<Value> {
        match self.data {
            None => vec![],
            Some(SnapshotData::Records(records)) => records,
            Some(SnapshotData::Listing { vessels, source }) => {
                debug!("snapshot source: {source:?}");
                vessels.unwrap_or_default()
            }
        }
    }
}

impl TryFrom<RawVesselPosition> for VesselPosition {
    type Error = ValidationError;

    fn try_from(v: RawVesselPosition) -> Result<Self, Self::Error> {
        let RawVesselPosition {
            mmsi,
            latitude,
            longitude,
            speed_knots,
            course_degrees,
            heading_degrees,
            name,
            status,
            vessel_type,
            destination,
            source,
            observed_at,
        } = v;

        let mmsi: Mmsi = match mmsi.context(MissingSnafu { field: "mmsi" })? {
            RawMmsi::Text(v) => v.parse()?,
            RawMmsi::Number(v) => v.to_string().parse()?,
        };

        let position = GeoPoint::new(
            latitude.context(MissingSnafu { field: "latitude" })?,
            longitude.context(MissingSnafu { field: "longitude" })?,
        )?;

        let observed_at = observed_at.and_then(|v| match DateTime::parse_from_rfc3339(&v) {
            Ok(v) => Some(v.with_timezone(&Utc)),
            Err(e) => {
                warn!("invalid observed_at '{v}' for vessel '{mmsi}': {e:?}");
                None
            }
        });

        Ok(VesselPosition {
            mmsi,
            position,
            speed_knots: speed_knots.filter(|v| v.is_finite()),
            course_degrees: course_degrees.filter(|v| v.is_finite()),
            heading_degrees: heading_degrees.filter(|v| v.is_finite()).unwrap_or(0.0),
            name,
            status,
            vessel_type,
            destination,
            source,
            observed_at,
        })
    }
}

pub fn parse_record(record: Value) -> Result<VesselPosition, ValidationError> {
    let raw: RawVesselPosition = serde_json::from_value(record).context(MalformedSnafu)?;
    VesselPosition::try_from(raw)
}

/// Validates every record on its own, dropping (and logging) the ones that cannot be stored.
///
/// With `bounds` given, records outside of them are dropped as well.
pub fn validate_records(records: Vec<Value>, bounds: Option<&Bounds>) -> Vec<VesselPosition> {
    let mut vessels = Vec::with_capacity(records.len());

    for record in records {
        match parse_record(record) {
            Err(e) => warn!("rejected vessel record: {e:?}"),
            Ok(v) => match bounds {
                Some(b) if !b.contains(&v.position) => {
                    debug!("vessel '{}' reported outside of requested bounds", v.mmsi)
                }
                _ => vessels.push(v),
            },
        }
    }

    vessels
}
