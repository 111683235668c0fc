use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownMetric;

/// Direction in which a metric's readings become more severe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Larger values are worse (temperature, humidity, light)
    HigherIsWorse,
    /// Smaller values are worse (soil moisture)
    LowerIsWorse,
}

/// Static configuration for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricProfile {
    pub min: f64,
    pub max: f64,
    pub volatility: f64,
    pub warning: f64,
    pub critical: f64,
    pub unit: &'static str,
    pub severity: Severity,
    /// Value the simulator starts from
    pub initial: f64,
    pub label: &'static str,
}

const TEMPERATURE: MetricProfile = MetricProfile {
    min: 18.0,
    max: 40.0,
    volatility: 0.3,
    warning: 30.0,
    critical: 35.0,
    unit: "°C",
    severity: Severity::HigherIsWorse,
    initial: 25.0,
    label: "Temperature",
};

const HUMIDITY: MetricProfile = MetricProfile {
    min: 30.0,
    max: 90.0,
    volatility: 2.0,
    warning: 75.0,
    critical: 85.0,
    unit: "%",
    severity: Severity::HigherIsWorse,
    initial: 60.0,
    label: "Humidity",
};

const SOIL_MOISTURE: MetricProfile = MetricProfile {
    min: 15.0,
    max: 80.0,
    volatility: 1.0,
    warning: 30.0,
    critical: 20.0,
    unit: "%",
    severity: Severity::LowerIsWorse,
    initial: 45.0,
    label: "Soil Moisture",
};

const LIGHT: MetricProfile = MetricProfile {
    min: 200.0,
    max: 1200.0,
    volatility: 30.0,
    warning: 800.0,
    critical: 1000.0,
    unit: "lux",
    severity: Severity::HigherIsWorse,
    initial: 650.0,
    label: "Light Intensity",
};

/// Monitored sensor dimension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    SoilMoisture,
    Light,
}

impl Metric {
    /// All metrics in display order
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::Light,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::SoilMoisture => "soil_moisture",
            Metric::Light => "light",
        }
    }

    pub fn profile(&self) -> &'static MetricProfile {
        match self {
            Metric::Temperature => &TEMPERATURE,
            Metric::Humidity => &HUMIDITY,
            Metric::SoilMoisture => &SOIL_MOISTURE,
            Metric::Light => &LIGHT,
        }
    }

    pub fn unit(&self) -> &'static str {
        self.profile().unit
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            "soil_moisture" => Ok(Metric::SoilMoisture),
            "light" => Ok(Metric::Light),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// One value per metric, addressable by [`Metric`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerMetric<T> {
    pub temperature: T,
    pub humidity: T,
    pub soil_moisture: T,
    pub light: T,
}

impl<T> PerMetric<T> {
    /// Build by evaluating `f` once per metric
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            temperature: f(Metric::Temperature),
            humidity: f(Metric::Humidity),
            soil_moisture: f(Metric::SoilMoisture),
            light: f(Metric::Light),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::SoilMoisture => &self.soil_moisture,
            Metric::Light => &self.light,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut T {
        match metric {
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::SoilMoisture => &mut self.soil_moisture,
            Metric::Light => &mut self.light,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}
