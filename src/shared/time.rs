use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Clock trait for abstracting time operations
/// The feed stamps every tick, reading and status change through it
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test implementation of Clock with fixed/controllable time
/// Clones share the same instant, so a test can keep one handle and advance
/// the clock it handed to the feed
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a new FixedClock with the given timestamp
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Arc::new(Mutex::new(timestamp)),
        }
    }

    /// Create a FixedClock from epoch seconds
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        let timestamp = DateTime::from_timestamp(seconds, 0).unwrap_or_default();
        Self::new(timestamp)
    }

    /// Advance time by the given number of seconds
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock() += chrono::Duration::seconds(seconds);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // a poisoned clock still holds a valid instant
        self.timestamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_now() {
        let clock = SystemClock::new();
        let now = clock.now().timestamp();

        // After 2020-01-01 and before 2100-01-01
        assert!(now > 1577836800);
        assert!(now < 4102444800);
    }

    #[test]
    fn test_fixed_clock_from_epoch_seconds() {
        let clock = FixedClock::from_epoch_seconds(1705316400);
        assert!(clock.now().to_rfc3339().starts_with("2024-01-15T11:00:00"));
        assert_eq!(clock.now().timestamp(), 1705316400);
    }

    #[test]
    fn test_fixed_clock_advance_is_shared_between_clones() {
        let clock = FixedClock::from_epoch_seconds(1705316400);
        let handed_out = clock.clone();

        clock.advance_seconds(3600);

        assert_eq!(handed_out.now().timestamp(), 1705320000);
    }

    #[test]
    fn test_clock_trait_object() {
        let system_clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let fixed_clock: Arc<dyn Clock> = Arc::new(FixedClock::from_epoch_seconds(1705316400));

        let _ = system_clock.now();
        assert_eq!(fixed_clock.now().timestamp(), 1705316400);
    }
}
