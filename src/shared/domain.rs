use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metric::Metric;

/// Discrete severity of a sensor's latest value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Optimal,
    Warning,
    Critical,
    Offline,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Optimal => "optimal",
            SensorStatus::Warning => "warning",
            SensorStatus::Critical => "critical",
            SensorStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic position of a site or sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Location of the simulated site
pub const SITE_LOCATION: GeoPoint = GeoPoint {
    lat: -8.65,
    lng: 115.22,
};

/// Registered sensor, as stored in the sensors table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub metric: Metric,
    pub location_lat: f64,
    pub location_lng: f64,
    pub status: SensorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sensor {
    /// Create a sensor in the optimal state, stamped with `now`
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        metric: Metric,
        location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metric,
            location_lat: location.lat,
            location_lng: location.lng,
            status: SensorStatus::Optimal,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.location_lat,
            lng: self.location_lng,
        }
    }
}

/// A single persisted reading for one sensor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    pub id: String,
    pub sensor_id: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_sensor_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SensorStatus::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(SensorStatus::Offline.to_string(), "offline");
    }

    #[test]
    fn test_sensor_json_uses_type_field() {
        let sensor = Sensor::new(
            "1",
            "Sensor A - Greenhouse 1",
            Metric::Temperature,
            SITE_LOCATION,
            fixed_now(),
        );

        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["type"], "temperature");
        assert_eq!(json["status"], "optimal");
        assert_eq!(json["location_lat"], -8.65);
        assert!(json["created_at"]
            .as_str()
            .unwrap()
            .starts_with("2024-01-15T10:30:00"));

        let back: Sensor = serde_json::from_value(json).unwrap();
        assert_eq!(back, sensor);
    }

    #[test]
    fn test_sensor_with_unknown_type_is_rejected() {
        let json = r#"{
            "id": "9",
            "name": "Rain gauge",
            "type": "rainfall",
            "location_lat": 0.0,
            "location_lng": 0.0,
            "status": "optimal",
            "created_at": "2024-01-15T10:30:00Z",
            "updated_at": "2024-01-15T10:30:00Z"
        }"#;
        assert!(serde_json::from_str::<Sensor>(json).is_err());
    }

    #[test]
    fn test_sensor_location() {
        let sensor = Sensor::new(
            "3",
            "Sensor C - Rice Field",
            Metric::SoilMoisture,
            GeoPoint {
                lat: -8.66,
                lng: 115.20,
            },
            fixed_now(),
        );
        assert_eq!(sensor.location().lat, -8.66);
        assert_eq!(sensor.location().lng, 115.20);
    }
}
