//! Property Test: History Buffer Capacity
//!
//! This property test verifies that:
//! - A series never holds more points than its capacity
//! - Overflowing a series keeps exactly the newest points in insertion order

use agri_feed::{HistoricalSeries, Reading, DEFAULT_MAX_POINTS};
use chrono::{DateTime, Duration};
use proptest::prelude::*;

fn point(i: usize, value: f64) -> Reading {
    let base = DateTime::from_timestamp(1_705_316_400, 0).unwrap();
    Reading {
        timestamp: base + Duration::seconds(i as i64 * 10),
        value,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Appending N+5 points leaves the last N in original order
    #[test]
    fn prop_overflow_keeps_last_n(capacity in 1usize..64, values in prop::collection::vec(-1_000.0f64..1_000.0, 69)) {
        let mut series = HistoricalSeries::with_capacity(capacity);
        let points: Vec<Reading> = values
            .iter()
            .take(capacity + 5)
            .enumerate()
            .map(|(i, v)| point(i, *v))
            .collect();

        for p in &points {
            series.append(*p);
        }

        let kept: Vec<Reading> = series.iter().copied().collect();
        prop_assert_eq!(series.len(), capacity);
        prop_assert_eq!(&kept[..], &points[points.len() - capacity..]);
    }

    /// Property: Length is min(appended, capacity) after every append
    #[test]
    fn prop_length_never_exceeds_capacity(capacity in 1usize..32, count in 0usize..100) {
        let mut series = HistoricalSeries::with_capacity(capacity);
        for i in 0..count {
            series.append(point(i, i as f64));
            prop_assert_eq!(series.len(), (i + 1).min(capacity));
        }
    }

    /// Property: Timestamps stay non-decreasing through eviction
    #[test]
    fn prop_timestamps_non_decreasing(count in 0usize..80) {
        let mut series = HistoricalSeries::default();
        for i in 0..count {
            series.append(point(i, 0.0));
        }
        let stamps: Vec<_> = series.iter().map(|r| r.timestamp).collect();
        prop_assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[cfg(test)]
mod additional_tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(HistoricalSeries::default().capacity(), DEFAULT_MAX_POINTS);
        assert_eq!(DEFAULT_MAX_POINTS, 20);
    }

    #[test]
    fn test_capacity_five_after_ten_appends() {
        let mut series = HistoricalSeries::with_capacity(5);
        for i in 0..10 {
            series.append(point(i, i as f64));
        }
        assert_eq!(series.values(), vec![5.0, 6.0, 7.0, 8.0, 9.0]);
    }
}
