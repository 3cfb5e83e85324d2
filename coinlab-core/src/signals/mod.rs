//! Signal sources: turn a bar history into a per-bar BUY / SELL / HOLD series.
//!
//! Every source is a pure function of the bars it is given. The decision at
//! bar t is taken from indicator values at t-1 and t only (see `scan_pairs`),
//! so signals never look ahead.

pub mod buy_and_hold;
pub mod ma_crossover;
pub mod macd_crossover;
pub mod rsi_threshold;

pub use buy_and_hold::BuyAndHold;
pub use ma_crossover::{MaCrossover, MaType};
pub use macd_crossover::MacdCrossover;
pub use rsi_threshold::RsiThreshold;

use crate::domain::{PriceBar, Signal, SignalSeries};

/// Signal source trait. Sources see bars only, never engine state.
pub trait SignalSource: Send + Sync {
    fn name(&self) -> &str;

    /// Bars needed before the source can emit anything other than HOLD.
    fn warmup_bars(&self) -> usize;

    /// One signal per bar; output length equals `bars.len()`.
    fn generate(&self, bars: &[PriceBar]) -> SignalSeries;
}

/// Consecutive-pair scan. Index 0 is always HOLD; for i >= 1 the signal is
/// `step(values[i - 1], values[i])`.
pub fn scan_pairs<T, F>(values: &[T], mut step: F) -> SignalSeries
where
    T: Copy,
    F: FnMut(T, T) -> Signal,
{
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(Signal::Hold);
    }
    out.extend(values.windows(2).map(|w| step(w[0], w[1])));
    SignalSeries::new(out)
}

/// Line-crossover rule shared by the MA and MACD sources.
///
/// BUY when `a` moves from at-or-below `b` to strictly above it, SELL on the
/// mirror move. Any `NaN` makes both comparisons false, so the result is HOLD.
pub(crate) fn crossover(prev: (f64, f64), cur: (f64, f64)) -> Signal {
    let (prev_a, prev_b) = prev;
    let (a, b) = cur;
    if a > b && prev_a <= prev_b {
        Signal::Buy
    } else if a < b && prev_a >= prev_b {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Zip two equal-length lines into pairs for `scan_pairs`.
pub(crate) fn zip_lines(a: &[f64], b: &[f64]) -> Vec<(f64, f64)> {
    a.iter().copied().zip(b.iter().copied()).collect()
}
