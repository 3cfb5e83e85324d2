//! RSI threshold strategy: buy out of oversold, sell out of overbought.

use super::{scan_pairs, SignalSource};
use crate::domain::{PriceBar, Signal, SignalSeries};
use crate::indicators::{Indicator, Rsi};

/// BUY when RSI crosses above `oversold`, SELL when it crosses below
/// `overbought`. Warmup (`NaN` RSI) is HOLD.
#[derive(Debug, Clone)]
pub struct RsiThreshold {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThreshold {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(
            (0.0..=100.0).contains(&oversold) && (0.0..=100.0).contains(&overbought),
            "thresholds must be within 0..=100"
        );
        assert!(oversold < overbought, "oversold must be < overbought");
        Self {
            period,
            oversold,
            overbought,
        }
    }
}

impl Default for RsiThreshold {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl SignalSource for RsiThreshold {
    fn name(&self) -> &str {
        "rsi_threshold"
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn generate(&self, bars: &[PriceBar]) -> SignalSeries {
        let rsi = Rsi::new(self.period).compute(bars);
        let (oversold, overbought) = (self.oversold, self.overbought);
        scan_pairs(&rsi, |prev, cur| {
            if cur > oversold && prev <= oversold {
                Signal::Buy
            } else if cur < overbought && prev >= overbought {
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
    }
}
