use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{GeoPoint, Sensor, SensorStatus};
use crate::metric::Metric;

/// Sensors known to the feed, keyed by id and listed in insertion order
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: Vec<Sensor>,
    index: HashMap<String, usize>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry; a later sensor with a repeated id replaces the earlier one
    pub fn from_sensors(sensors: impl IntoIterator<Item = Sensor>) -> Self {
        let mut registry = Self::new();
        registry.merge(sensors);
        registry
    }

    /// The four field sensors of the demo site
    pub fn default_site(now: DateTime<Utc>) -> Self {
        let seed = [
            ("1", "Sensor A - Greenhouse 1", Metric::Temperature, -8.65, 115.22, SensorStatus::Optimal),
            ("2", "Sensor B - Greenhouse 2", Metric::Humidity, -8.64, 115.23, SensorStatus::Warning),
            ("3", "Sensor C - Rice Field", Metric::SoilMoisture, -8.66, 115.20, SensorStatus::Critical),
            ("4", "Sensor D - Open Field", Metric::Light, -8.63, 115.21, SensorStatus::Optimal),
        ];

        Self::from_sensors(seed.into_iter().map(|(id, name, metric, lat, lng, status)| {
            let mut sensor = Sensor::new(id, name, metric, GeoPoint { lat, lng }, now);
            sensor.status = status;
            sensor
        }))
    }

    /// Parse a JSON array of sensors
    pub fn load_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let sensors: Vec<Sensor> = serde_json::from_slice(bytes)?;
        Ok(Self::from_sensors(sensors))
    }

    pub fn list(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Sensor> {
        self.index.get(id).map(|&i| &self.sensors[i])
    }

    /// Every sensor measuring `metric`
    pub fn of_metric(&self, metric: Metric) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter().filter(move |s| s.metric == metric)
    }

    /// Set a sensor's status and `updated_at`.
    ///
    /// Returns `false` without touching anything when the id is unknown, which
    /// happens when an update races a registry refresh.
    pub fn update_status(&mut self, id: &str, status: SensorStatus, at: DateTime<Utc>) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                let sensor = &mut self.sensors[i];
                sensor.status = status;
                sensor.updated_at = at;
                true
            }
            None => {
                debug!(sensor_id = %id, "Status update for unknown sensor ignored");
                false
            }
        }
    }

    /// Upsert sensors by id. Sensors missing from `incoming` are kept.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Sensor>) {
        for sensor in incoming {
            match self.index.get(&sensor.id) {
                Some(&i) => self.sensors[i] = sensor,
                None => {
                    self.index.insert(sensor.id.clone(), self.sensors.len());
                    self.sensors.push(sensor);
                }
            }
        }
    }

    /// Mark sensors not updated within `window` as offline.
    /// Returns how many sensors changed state.
    pub fn sweep_offline(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let mut changed = 0;
        for sensor in &mut self.sensors {
            if sensor.status != SensorStatus::Offline && now - sensor.updated_at > window {
                sensor.status = SensorStatus::Offline;
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_705_316_400, 0).unwrap()
    }

    #[test]
    fn test_default_site_has_one_sensor_per_metric() {
        let registry = SensorRegistry::default_site(now());
        assert_eq!(registry.len(), 4);
        for metric in Metric::ALL {
            assert_eq!(registry.of_metric(metric).count(), 1, "{}", metric);
        }
        assert_eq!(registry.get("3").unwrap().name, "Sensor C - Rice Field");
    }

    #[test]
    fn test_update_status_known_sensor() {
        let mut registry = SensorRegistry::default_site(now());
        let later = now() + Duration::seconds(10);

        assert!(registry.update_status("1", SensorStatus::Critical, later));

        let sensor = registry.get("1").unwrap();
        assert_eq!(sensor.status, SensorStatus::Critical);
        assert_eq!(sensor.updated_at, later);
        assert_eq!(sensor.created_at, now());
    }

    #[test]
    fn test_update_status_unknown_sensor_is_noop() {
        let mut registry = SensorRegistry::default_site(now());
        let before: Vec<Sensor> = registry.list().to_vec();

        assert!(!registry.update_status("missing", SensorStatus::Critical, now()));
        assert_eq!(registry.list(), before.as_slice());
    }

    #[test]
    fn test_merge_upserts_and_keeps_order() {
        let mut registry = SensorRegistry::default_site(now());
        let mut renamed = registry.get("2").unwrap().clone();
        renamed.name = "Greenhouse 2 (north)".to_string();
        let extra = Sensor::new(
            "5",
            "Sensor E - Nursery",
            Metric::Temperature,
            GeoPoint { lat: -8.6, lng: 115.2 },
            now(),
        );

        registry.merge(vec![renamed, extra]);

        let ids: Vec<&str> = registry.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(registry.get("2").unwrap().name, "Greenhouse 2 (north)");
        assert_eq!(registry.of_metric(Metric::Temperature).count(), 2);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let a = Sensor::new("x", "first", Metric::Light, GeoPoint { lat: 0.0, lng: 0.0 }, now());
        let b = Sensor::new("x", "second", Metric::Light, GeoPoint { lat: 0.0, lng: 0.0 }, now());
        let registry = SensorRegistry::from_sensors(vec![a, b]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().name, "second");
    }

    #[test]
    fn test_sweep_offline_marks_stale_sensors() {
        let mut registry = SensorRegistry::default_site(now());
        let later = now() + Duration::minutes(20);
        registry.update_status("4", SensorStatus::Optimal, later);

        let changed = registry.sweep_offline(later, Duration::minutes(10));

        assert_eq!(changed, 3);
        assert_eq!(registry.get("1").unwrap().status, SensorStatus::Offline);
        assert_eq!(registry.get("4").unwrap().status, SensorStatus::Optimal);
        // already offline sensors are not counted twice
        assert_eq!(registry.sweep_offline(later, Duration::minutes(10)), 0);
    }

    #[test]
    fn test_load_json() {
        let json = r#"[
            {
                "id": "a1",
                "name": "Orchard probe",
                "type": "soil_moisture",
                "location_lat": -8.7,
                "location_lng": 115.1,
                "status": "warning",
                "created_at": "2024-01-15T10:30:00Z",
                "updated_at": "2024-01-15T10:30:00Z"
            }
        ]"#;
        let registry = SensorRegistry::load_json(json.as_bytes()).unwrap();
        let sensor = registry.get("a1").unwrap();
        assert_eq!(sensor.metric, Metric::SoilMoisture);
        assert_eq!(sensor.status, SensorStatus::Warning);
    }

    #[test]
    fn test_load_json_rejects_unknown_metric() {
        let json = r#"[{"id":"b","name":"n","type":"co2","location_lat":0,"location_lng":0,
            "status":"optimal","created_at":"2024-01-15T10:30:00Z","updated_at":"2024-01-15T10:30:00Z"}]"#;
        assert!(SensorRegistry::load_json(json.as_bytes()).is_err());
    }
}
