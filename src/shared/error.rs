use std::time::Duration;
use thiserror::Error;

/// A metric name outside the closed set of monitored metrics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown metric type: {0}")]
pub struct UnknownMetric(pub String);

/// Errors raised by a remote sensor store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Rejected feed options
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("Tick interval must be greater than zero")]
    ZeroInterval,

    #[error("Tick interval must not exceed {0:?}")]
    IntervalTooLong(Duration),

    #[error("Persistence timeout must be greater than zero")]
    ZeroTimeout,

    #[error("History capacity must be at least one point")]
    ZeroCapacity,

    #[error("Registry refresh period must be at least one tick")]
    ZeroRefresh,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}
