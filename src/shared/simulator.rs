use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::metric::Metric;

/// Advance a bounded random walk by one step.
///
/// Adds a uniform offset in `[-volatility/2, +volatility/2)`, rounds to two
/// decimals and bounds the result to `[min, max]`. Never panics: an inverted
/// range yields `min` and a NaN step lands on a bound.
pub fn next_value<R: Rng + ?Sized>(
    rng: &mut R,
    current: f64,
    min: f64,
    max: f64,
    volatility: f64,
) -> f64 {
    let change = (rng.gen::<f64>() - 0.5) * volatility;
    bound(round_2dp(current + change), min, max)
}

// f64::clamp panics on an inverted range; min/max also absorb NaN
fn bound(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Random walk generator owning its own random source
#[derive(Debug, Clone)]
pub struct ValueSimulator {
    rng: StdRng,
}

impl ValueSimulator {
    /// Reproducible simulator for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn next_value(&mut self, current: f64, min: f64, max: f64, volatility: f64) -> f64 {
        next_value(&mut self.rng, current, min, max, volatility)
    }

    /// Step `current` using the metric's range and volatility
    pub fn next_for(&mut self, metric: Metric, current: f64) -> f64 {
        let p = metric.profile();
        self.next_value(current, p.min, p.max, p.volatility)
    }

    /// Uniform value anywhere in the metric's range, rounded to two decimals
    pub fn sample_in_range(&mut self, metric: Metric) -> f64 {
        let p = metric.profile();
        let value = self.rng.gen::<f64>() * (p.max - p.min) + p.min;
        bound(round_2dp(value), p.min, p.max)
    }

    /// Bernoulli draw from the same source
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }
}
