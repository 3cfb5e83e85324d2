//! Buy-and-hold baseline.

use super::SignalSource;
use crate::domain::{PriceBar, Signal, SignalSeries};

/// BUY on the first bar, HOLD afterwards. The position stays open at the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalSource for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn generate(&self, bars: &[PriceBar]) -> SignalSeries {
        (0..bars.len())
            .map(|i| if i == 0 { Signal::Buy } else { Signal::Hold })
            .collect()
    }
}
