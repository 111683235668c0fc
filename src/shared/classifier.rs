use crate::domain::SensorStatus;
use crate::error::UnknownMetric;
use crate::metric::{Metric, Severity};

/// Classify a value against the thresholds of its metric.
///
/// Thresholds are inclusive: a value sitting exactly on the critical
/// threshold is critical. Soil moisture is checked downward, every other
/// metric upward.
pub fn classify(metric: Metric, value: f64) -> SensorStatus {
    let profile = metric.profile();
    let breaches = |threshold: f64| match profile.severity {
        Severity::HigherIsWorse => value >= threshold,
        Severity::LowerIsWorse => value <= threshold,
    };

    if breaches(profile.critical) {
        SensorStatus::Critical
    } else if breaches(profile.warning) {
        SensorStatus::Warning
    } else {
        SensorStatus::Optimal
    }
}

/// Classify a value for a metric given by name
pub fn classify_named(metric: &str, value: f64) -> Result<SensorStatus, UnknownMetric> {
    let metric: Metric = metric.parse()?;
    Ok(classify(metric, value))
}
