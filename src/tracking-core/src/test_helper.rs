use rand::Rng;

use crate::{GeoPoint, Mmsi, VesselPosition};

impl Mmsi {
    pub fn test_new() -> Mmsi {
        rand::rng()
            .random_range(200_000_000u32..800_000_000)
            .to_string()
            .parse()
            .unwrap()
    }
}

impl VesselPosition {
    pub fn test_default(mmsi: Option<Mmsi>) -> VesselPosition {
        let mut rng = rand::rng();
        VesselPosition {
            mmsi: mmsi.unwrap_or_else(Mmsi::test_new),
            position: GeoPoint {
                latitude: rng.random_range(-80.0..80.0),
                longitude: rng.random_range(-170.0..170.0),
            },
            speed_knots: Some(rng.random_range(0.0..25.0)),
            course_degrees: Some(rng.random_range(0.0..360.0)),
            heading_degrees: rng.random_range(0.0..360.0),
            name: Some("test_vessel".to_string()),
            status: Some("underway".to_string()),
            vessel_type: Some("cargo".to_string()),
            destination: Some("BERGEN".to_string()),
            source: Some("test".to_string()),
            observed_at: Some(chrono::Utc::now()),
        }
    }

    pub fn test_at(mmsi: &str, latitude: f64, longitude: f64) -> VesselPosition {
        let mut v = Self::test_default(Some(mmsi.parse().unwrap()));
        v.position = GeoPoint::new(latitude, longitude).unwrap();
        v
    }
}

