use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::VesselPosition;

/// Coarse vessel classification used for marker styling.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum VesselCategory {
    Cargo,
    Tanker,
    Passenger,
    Fishing,
    Tug,
    Military,
    Sailing,
    #[default]
    Other,
}

/// Everything the map surface needs to style and label a vessel, besides its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMetadata {
    pub name: Option<String>,
    pub vessel_type: Option<String>,
    pub category: VesselCategory,
    pub status: Option<String>,
    pub speed_knots: Option<f64>,
    pub course_degrees: Option<f64>,
    /// Marker rotation in degrees.
    pub heading_degrees: f64,
    pub destination: Option<String>,
    pub source: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl VesselCategory {
    /// Free-form vessel types that match no category are [VesselCategory::Other].
    pub fn from_vessel_type(vessel_type: Option<&str>) -> Self {
        vessel_type
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Marker fill colour.
    pub fn color(&self) -> &'static str {
        match self {
            VesselCategory::Cargo => "#3b82f6",
            VesselCategory::Tanker => "#ef4444",
            VesselCategory::Passenger => "#10b981",
            VesselCategory::Fishing => "#8b5cf6",
            VesselCategory::Tug => "#f59e0b",
            VesselCategory::Military => "#6b7280",
            VesselCategory::Sailing => "#06b6d4",
            VesselCategory::Other => "#111827",
        }
    }
}

impl From<&VesselPosition> for DisplayMetadata {
    fn from(v: &VesselPosition) -> Self {
        Self {
            name: v.name.clone(),
            vessel_type: v.vessel_type.clone(),
            category: VesselCategory::from_vessel_type(v.vessel_type.as_deref()),
            status: v.status.clone(),
            speed_knots: v.speed_knots,
            course_degrees: v.course_degrees,
            heading_degrees: v.heading_degrees,
            destination: v.destination.clone(),
            source: v.source.clone(),
            observed_at: v.observed_at,
        }
    }
}
