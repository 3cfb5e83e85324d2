//! Moving average crossover: golden cross buys, death cross sells.

use super::{crossover, scan_pairs, zip_lines, SignalSource};
use crate::domain::{PriceBar, SignalSeries};
use crate::indicators::{Ema, Indicator, Sma};
use serde::{Deserialize, Serialize};

/// Moving average type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

/// BUY when the fast MA crosses above the slow MA, SELL when it crosses below.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub ma_type: MaType,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize, ma_type: MaType) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
            ma_type,
        }
    }

    fn line(&self, period: usize, bars: &[PriceBar]) -> Vec<f64> {
        match self.ma_type {
            MaType::Sma => Sma::new(period).compute(bars),
            MaType::Ema => Ema::new(period).compute(bars),
        }
    }
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self::new(20, 50, MaType::Sma)
    }
}

impl SignalSource for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        match self.ma_type {
            MaType::Sma => self.slow_period,
            MaType::Ema => 1,
        }
    }

    fn generate(&self, bars: &[PriceBar]) -> SignalSeries {
        let fast = self.line(self.fast_period, bars);
        let slow = self.line(self.slow_period, bars);
        scan_pairs(&zip_lines(&fast, &slow), crossover)
    }
}
