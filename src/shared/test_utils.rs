//! Test utilities for property-based testing
//!
//! Generators for metrics, in-range and arbitrary values, timestamps and
//! whole sensors, for use with the proptest framework.

pub mod generators {
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    use crate::domain::{GeoPoint, Sensor, SensorStatus};
    use crate::metric::Metric;

    /// Any of the monitored metrics
    pub fn metric() -> impl Strategy<Value = Metric> {
        prop_oneof![
            Just(Metric::Temperature),
            Just(Metric::Humidity),
            Just(Metric::SoilMoisture),
            Just(Metric::Light),
        ]
    }

    /// A metric paired with a value inside its valid range
    pub fn metric_with_value() -> impl Strategy<Value = (Metric, f64)> {
        metric().prop_flat_map(|m| {
            let p = m.profile();
            (Just(m), p.min..=p.max)
        })
    }

    /// Finite values well beyond every metric's range, in both directions
    pub fn wide_value() -> impl Strategy<Value = f64> {
        -10_000.0f64..10_000.0f64
    }

    pub fn status() -> impl Strategy<Value = SensorStatus> {
        prop_oneof![
            Just(SensorStatus::Optimal),
            Just(SensorStatus::Warning),
            Just(SensorStatus::Critical),
            Just(SensorStatus::Offline),
        ]
    }

    /// Timestamp between 2020-01-01 and 2030-12-31
    pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1_577_836_800i64..1_924_991_999i64)
            .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn sensor() -> impl Strategy<Value = Sensor> {
        (
            "[a-z0-9]{1,8}",
            "[A-Za-z ]{1,24}",
            metric(),
            -90.0f64..90.0,
            -180.0f64..180.0,
            status(),
            timestamp(),
        )
            .prop_map(|(id, name, metric, lat, lng, status, at)| {
                let mut sensor = Sensor::new(id, name, metric, GeoPoint { lat, lng }, at);
                sensor.status = status;
                sensor
            })
    }
}
