//! Technical indicators.
//!
//! Indicators are pure functions: bar history in, numeric series out, same
//! length as the input. Warmup positions are `f64::NAN`. No value at bar t
//! may depend on bars after t; every indicator passes the truncated-vs-full
//! series test in `tests/lookahead_test.rs`.
//!
//! Multi-line indicators (MACD, Bollinger, Stochastic) return their lines as
//! a struct instead of implementing the single-series `Indicator` trait.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBands};
pub use ema::Ema;
pub use macd::{Macd, MacdLines};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticLines};

use crate::domain::PriceBar;
use std::collections::BTreeMap;

/// Single-series indicator.
pub trait Indicator: Send + Sync {
    /// Series name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are `NaN`.
    fn lookback(&self) -> usize;

    /// Compute over the entire bar series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Named indicator series, all aligned with the same bar series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Compute `indicator` and store it under its own name.
    pub fn add(&mut self, indicator: &dyn Indicator, bars: &[PriceBar]) {
        self.insert(indicator.name(), indicator.compute(bars));
    }

    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Series names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The common indicator set used for analysis output.
///
/// sma_20, sma_50, ema_12, ema_26, rsi_14, macd / macd_signal / macd_histogram,
/// bb_upper / bb_middle / bb_lower, atr_14, stoch_k / stoch_d.
pub fn standard_indicators(bars: &[PriceBar]) -> IndicatorValues {
    let mut values = IndicatorValues::new();

    values.add(&Sma::new(20), bars);
    values.add(&Sma::new(50), bars);
    values.add(&Ema::new(12), bars);
    values.add(&Ema::new(26), bars);
    values.add(&Rsi::new(14), bars);
    values.add(&Atr::new(14), bars);

    let macd = Macd::default().compute(bars);
    values.insert("macd", macd.macd);
    values.insert("macd_signal", macd.signal);
    values.insert("macd_histogram", macd.histogram);

    let bb = Bollinger::default().compute(bars);
    values.insert("bb_upper", bb.upper);
    values.insert("bb_middle", bb.middle);
    values.insert("bb_lower", bb.lower);

    let stoch = Stochastic::default().compute(bars);
    values.insert("stoch_k", stoch.k);
    values.insert("stoch_d", stoch.d);

    values
}

/// Rolling mean over `period` values. A window containing `NaN` yields `NaN`.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        window.iter().sum::<f64>() / period as f64
    })
}

/// Rolling sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |window| {
        if period < 2 {
            return f64::NAN;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        var.sqrt()
    })
}

/// Apply `f` to every full window ending at each index; `NaN` elsewhere.
fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for end in (period - 1)..n {
        let window = &values[end + 1 - period..=end];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[end] = f(window);
    }
    result
}
