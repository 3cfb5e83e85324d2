//! MACD crossover: MACD line against its signal line.

use super::{crossover, scan_pairs, zip_lines, SignalSource};
use crate::domain::{PriceBar, SignalSeries};
use crate::indicators::Macd;

/// BUY when the MACD line crosses above its signal line, SELL when it
/// crosses below.
#[derive(Debug, Clone)]
pub struct MacdCrossover {
    macd: Macd,
}

impl MacdCrossover {
    /// Panics under the same conditions as `Macd::new`.
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            macd: Macd::new(fast, slow, signal),
        }
    }

    /// `(fast, slow, signal)`.
    pub fn periods(&self) -> (usize, usize, usize) {
        self.macd.periods()
    }
}

impl Default for MacdCrossover {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl SignalSource for MacdCrossover {
    fn name(&self) -> &str {
        "macd_crossover"
    }

    fn warmup_bars(&self) -> usize {
        1
    }

    fn generate(&self, bars: &[PriceBar]) -> SignalSeries {
        let lines = self.macd.compute(bars);
        scan_pairs(&zip_lines(&lines.macd, &lines.signal), crossover)
    }
}
