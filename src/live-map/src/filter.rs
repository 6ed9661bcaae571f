use tracing::warn;
use tracking_core::VesselPosition;

use crate::settings::FilterSettings;

/// Drops vessels the user asked not to see, before they reach the position store.
#[derive(Debug, Clone, Default)]
pub struct VesselFilter {
    vessel_types: Vec<String>,
    statuses: Vec<String>,
}

impl VesselFilter {
    pub fn new(settings: &FilterSettings) -> Self {
        // The live payload carries neither flag nor cargo information.
        if settings.flag_country.is_some() {
            warn!("filter.flag_country is not supported by the live feed and is ignored");
        }
        if settings.cargo_type.is_some() {
            warn!("filter.cargo_type is not supported by the live feed and is ignored");
        }

        Self {
            vessel_types: normalize(&settings.vessel_types),
            statuses: normalize(&settings.statuses),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vessel_types.is_empty() && self.statuses.is_empty()
    }

    pub fn matches(&self, vessel: &VesselPosition) -> bool {
        matches_any(&self.vessel_types, vessel.vessel_type.as_deref())
            && matches_any(&self.statuses, vessel.status.as_deref())
    }

    pub fn apply(&self, mut vessels: Vec<VesselPosition>) -> Vec<VesselPosition> {
        if !self.is_empty() {
            vessels.retain(|v| self.matches(v));
        }
        vessels
    }
}

fn normalize(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn matches_any(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    value.is_some_and(|v| {
        let v = v.trim();
        allowed.iter().any(|a| a.eq_ignore_ascii_case(v))
    })
}
