//! Moving Average Convergence Divergence (MACD).
//!
//! macd = EMA(fast) - EMA(slow); signal = EMA(signal_period) of macd;
//! histogram = macd - signal. All EMAs seeded with their first value, so
//! every line is defined from bar 0.

use super::ema::ema_of_series;
use crate::domain::bar::closes;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

/// MACD output lines, each aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self { fast, slow, signal }
    }

    pub fn periods(&self) -> (usize, usize, usize) {
        (self.fast, self.slow, self.signal)
    }

    pub fn compute(&self, bars: &[PriceBar]) -> MacdLines {
        let close = closes(bars);
        let fast = ema_of_series(&close, self.fast);
        let slow = ema_of_series(&close, self.slow);

        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal);
        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        MacdLines {
            macd,
            signal,
            histogram,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}
