use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of points kept per metric
pub const DEFAULT_MAX_POINTS: usize = 20;

/// A single timestamped value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Fixed-capacity FIFO of readings, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "SeriesParts")]
pub struct HistoricalSeries {
    capacity: usize,
    points: VecDeque<Reading>,
}

impl HistoricalSeries {
    /// Create an empty series. A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point, evicting from the front until the capacity holds
    pub fn append(&mut self, point: Reading) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.points.back()
    }

    /// The point just before the latest one
    pub fn previous(&self) -> Option<&Reading> {
        self.points.len().checked_sub(2).and_then(|i| self.points.get(i))
    }

    /// Change between the last two points; zero with fewer than two
    pub fn trend(&self) -> f64 {
        match (self.latest(), self.previous()) {
            (Some(latest), Some(previous)) => latest.value - previous.value,
            _ => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.points.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Wire form of a series; rebuilt through `with_capacity` and `append`
#[derive(Deserialize)]
struct SeriesParts {
    capacity: usize,
    points: Vec<Reading>,
}

impl From<SeriesParts> for HistoricalSeries {
    fn from(parts: SeriesParts) -> Self {
        let mut series = HistoricalSeries::with_capacity(parts.capacity);
        for point in parts.points {
            series.append(point);
        }
        series
    }
}

impl Default for HistoricalSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn point(seconds: i64, value: f64) -> Reading {
        Reading {
            timestamp: DateTime::from_timestamp(1_705_316_400 + seconds, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn test_append_below_capacity_keeps_everything() {
        let mut series = HistoricalSeries::with_capacity(5);
        for i in 0..3 {
            series.append(point(i, i as f64));
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_append_past_capacity_evicts_oldest() {
        let n = 5;
        let mut series = HistoricalSeries::with_capacity(n);
        for i in 0..(n as i64 + 5) {
            series.append(point(i, i as f64));
        }
        assert_eq!(series.len(), n);
        assert_eq!(series.values(), vec![5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_order_is_insertion_order() {
        let mut series = HistoricalSeries::with_capacity(3);
        series.append(point(0, 10.0));
        series.append(point(1, 5.0));
        series.append(point(2, 7.5));
        series.append(point(3, 1.0));

        let stamps: Vec<_> = series.iter().map(|p| p.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(series.values(), vec![5.0, 7.5, 1.0]);
    }

    #[test]
    fn test_trend() {
        let mut series = HistoricalSeries::with_capacity(4);
        assert_eq!(series.trend(), 0.0);
        series.append(point(0, 25.0));
        assert_eq!(series.trend(), 0.0);
        assert!(series.previous().is_none());
        series.append(point(1, 25.5));
        assert!((series.trend() - 0.5).abs() < 1e-9);
        assert_eq!(series.previous().unwrap().value, 25.0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut series = HistoricalSeries::with_capacity(0);
        series.append(point(0, 1.0));
        series.append(point(1, 2.0));
        assert_eq!(series.capacity(), 1);
        assert_eq!(series.values(), vec![2.0]);
    }

    #[test]
    fn test_default_capacity() {
        let series = HistoricalSeries::default();
        assert_eq!(series.capacity(), DEFAULT_MAX_POINTS);
        assert!(series.is_empty());
    }

    #[test]
    fn test_latest_tracks_last_append() {
        let mut series = HistoricalSeries::with_capacity(2);
        let base = point(0, 1.0);
        series.append(base);
        let later = Reading {
            timestamp: base.timestamp + Duration::seconds(3),
            value: 4.0,
        };
        series.append(later);
        assert_eq!(series.latest(), Some(&later));
    }

    #[test]
    fn test_deserialize_keeps_capacity_invariants() {
        let mut series: HistoricalSeries =
            serde_json::from_str(r#"{"capacity":0,"points":[]}"#).unwrap();
        assert_eq!(series.capacity(), 1);
        series.append(point(0, 3.0));
        assert_eq!(series.values(), vec![3.0]);
    }

    #[test]
    fn test_deserialize_trims_excess_points() {
        let mut full = HistoricalSeries::with_capacity(4);
        for i in 0..4 {
            full.append(point(i, i as f64));
        }
        let json = serde_json::to_string(&full)
            .unwrap()
            .replace("\"capacity\":4", "\"capacity\":2");

        let series: HistoricalSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(series.capacity(), 2);
        assert_eq!(series.values(), vec![2.0, 3.0]);
    }
}
