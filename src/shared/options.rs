use std::str::FromStr;
use std::time::Duration;

use crate::error::OptionsError;
use crate::history::DEFAULT_MAX_POINTS;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_JITTER_PROBABILITY: f64 = 0.05;
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_OFFLINE_AFTER: Duration = Duration::from_secs(600);
/// Longest accepted tick interval; the timer's deadline must fit in an `Instant`
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tuning for a live feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOptions {
    /// Time between ticks
    pub interval: Duration,
    /// History capacity per metric
    pub max_points: usize,
    /// Simulate transient disconnects
    pub jitter: bool,
    /// Chance of a disconnect on any one tick while jitter is on
    pub jitter_probability: f64,
    /// Seed for the random source; entropy when absent
    pub seed: Option<u64>,
    /// Upper bound on each remote store call
    pub persist_timeout: Duration,
    /// Re-fetch the registry from the store every this many ticks
    pub refresh_every: Option<u64>,
    /// Sensors silent for longer than this are marked offline after a refresh
    pub offline_after: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_points: DEFAULT_MAX_POINTS,
            jitter: false,
            jitter_probability: DEFAULT_JITTER_PROBABILITY,
            seed: None,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            refresh_every: None,
            offline_after: DEFAULT_OFFLINE_AFTER,
        }
    }
}

impl FeedOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_refresh_every(mut self, ticks: u64) -> Self {
        self.refresh_every = Some(ticks);
        self
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.interval.is_zero() {
            return Err(OptionsError::ZeroInterval);
        }
        if self.interval > MAX_INTERVAL {
            return Err(OptionsError::IntervalTooLong(MAX_INTERVAL));
        }
        if self.persist_timeout.is_zero() {
            return Err(OptionsError::ZeroTimeout);
        }
        if self.max_points == 0 {
            return Err(OptionsError::ZeroCapacity);
        }
        if self.refresh_every == Some(0) {
            return Err(OptionsError::ZeroRefresh);
        }
        if !(0.0..=1.0).contains(&self.jitter_probability) {
            return Err(OptionsError::InvalidValue {
                name: "jitter_probability".to_string(),
                value: self.jitter_probability.to_string(),
            });
        }
        Ok(())
    }

    /// Load options from environment variables
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load options through an arbitrary variable lookup.
    ///
    /// Recognized names: `FEED_INTERVAL_MS`, `FEED_MAX_POINTS`, `FEED_JITTER`,
    /// `FEED_SEED`, `FEED_PERSIST_TIMEOUT_MS`, `FEED_REFRESH_TICKS`,
    /// `FEED_OFFLINE_AFTER_SECS`. Unset names keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "FEED_INTERVAL_MS")? {
            options.interval = Duration::from_millis(ms);
        }
        if let Some(points) = parse_var::<usize>(&lookup, "FEED_MAX_POINTS")? {
            options.max_points = points;
        }
        if let Some(raw) = lookup("FEED_JITTER") {
            options.jitter = parse_flag("FEED_JITTER", &raw)?;
        }
        options.seed = parse_var::<u64>(&lookup, "FEED_SEED")?;
        if let Some(ms) = parse_var::<u64>(&lookup, "FEED_PERSIST_TIMEOUT_MS")? {
            options.persist_timeout = Duration::from_millis(ms);
        }
        options.refresh_every = parse_var::<u64>(&lookup, "FEED_REFRESH_TICKS")?;
        if let Some(secs) = parse_var::<u64>(&lookup, "FEED_OFFLINE_AFTER_SECS")? {
            options.offline_after = Duration::from_secs(secs);
        }

        options.validate()?;
        Ok(options)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, OptionsError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| OptionsError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, OptionsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(OptionsError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}
