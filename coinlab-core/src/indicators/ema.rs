//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (period + 1), seeded with the first close (EMA[0] = close[0]).
//! Lookback: 0.

use super::Indicator;
use crate::domain::bar::closes;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.period)
    }
}

/// EMA of an arbitrary series, seeded with its first value.
///
/// Leading `NaN` values are skipped; the seed is the first non-`NaN` value.
/// A `NaN` after the seed taints every later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[start];
    result[start] = prev;

    for i in (start + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
