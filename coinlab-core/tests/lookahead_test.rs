//! Look-ahead contamination tests for every indicator and signal source.
//!
//! Invariant: no value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Bars 0..100 must be identical between both runs. Any
//! difference means the computation is leaking future data into past values.

use chrono::{Duration, TimeZone, Utc};
use coinlab_core::domain::{PriceBar, Signal};
use coinlab_core::indicators::*;
use coinlab_core::signals::{
    BuyAndHold, MaCrossover, MaType, MacdCrossover, RsiThreshold, SignalSource,
};

const FULL: usize = 200;
const TRUNCATED: usize = 100;

/// Deterministic pseudo-random walk using a simple LCG.
fn make_test_bars(n: usize) -> Vec<PriceBar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed >> 33) % 200) as f64 * 0.05 - 5.0;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(PriceBar::new(
            base + Duration::days(i as i64),
            open,
            open.max(close) + 2.0,
            open.min(close) - 2.0,
            close,
            1000.0 + i as f64 * 100.0,
        ));
    }

    bars
}

fn assert_prefix_equal(name: &str, truncated: &[f64], full: &[f64]) {
    assert_eq!(truncated.len(), TRUNCATED, "{name}: truncated length");
    assert_eq!(full.len(), FULL, "{name}: full length");
    for i in 0..TRUNCATED {
        let (t, f) = (truncated[i], full[i]);
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            t == f,
            "{name}: look-ahead at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator) {
    let bars = make_test_bars(FULL);
    let full = indicator.compute(&bars);
    let truncated = indicator.compute(&bars[..TRUNCATED]);
    assert_prefix_equal(indicator.name(), &truncated, &full);
}

fn assert_signals_no_lookahead(source: &dyn SignalSource) {
    let bars = make_test_bars(FULL);
    let full = source.generate(&bars);
    let truncated = source.generate(&bars[..TRUNCATED]);

    assert_eq!(full.len(), FULL, "{}: full length", source.name());
    assert_eq!(truncated.len(), TRUNCATED, "{}: truncated length", source.name());
    let full_prefix: Vec<Signal> = full.iter().take(TRUNCATED).collect();
    let truncated_all: Vec<Signal> = truncated.iter().collect();
    assert_eq!(
        truncated_all,
        full_prefix,
        "{}: signal prefix differs",
        source.name()
    );
}

// ── Single-series indicators ─────────────────────────────────────────

#[test]
fn sma_no_lookahead() {
    assert_no_lookahead(&Sma::new(20));
    assert_no_lookahead(&Sma::new(50));
}

#[test]
fn ema_no_lookahead() {
    assert_no_lookahead(&Ema::new(12));
    assert_no_lookahead(&Ema::new(26));
}

#[test]
fn rsi_no_lookahead() {
    assert_no_lookahead(&Rsi::new(14));
}

#[test]
fn atr_no_lookahead() {
    assert_no_lookahead(&Atr::new(14));
}

// ── Multi-line indicators ────────────────────────────────────────────

#[test]
fn macd_no_lookahead() {
    let bars = make_test_bars(FULL);
    let full = Macd::default().compute(&bars);
    let truncated = Macd::default().compute(&bars[..TRUNCATED]);
    assert_prefix_equal("macd", &truncated.macd, &full.macd);
    assert_prefix_equal("macd_signal", &truncated.signal, &full.signal);
    assert_prefix_equal("macd_histogram", &truncated.histogram, &full.histogram);
}

#[test]
fn bollinger_no_lookahead() {
    let bars = make_test_bars(FULL);
    let full = Bollinger::default().compute(&bars);
    let truncated = Bollinger::default().compute(&bars[..TRUNCATED]);
    assert_prefix_equal("bb_upper", &truncated.upper, &full.upper);
    assert_prefix_equal("bb_middle", &truncated.middle, &full.middle);
    assert_prefix_equal("bb_lower", &truncated.lower, &full.lower);
}

#[test]
fn stochastic_no_lookahead() {
    let bars = make_test_bars(FULL);
    let full = Stochastic::default().compute(&bars);
    let truncated = Stochastic::default().compute(&bars[..TRUNCATED]);
    assert_prefix_equal("stoch_k", &truncated.k, &full.k);
    assert_prefix_equal("stoch_d", &truncated.d, &full.d);
}

#[test]
fn standard_set_no_lookahead() {
    let bars = make_test_bars(FULL);
    let full = standard_indicators(&bars);
    let truncated = standard_indicators(&bars[..TRUNCATED]);
    for name in full.names() {
        assert_prefix_equal(
            name,
            truncated.get_series(name).unwrap(),
            full.get_series(name).unwrap(),
        );
    }
}

// ── Signal sources ───────────────────────────────────────────────────

#[test]
fn ma_crossover_no_lookahead() {
    assert_signals_no_lookahead(&MaCrossover::default());
    assert_signals_no_lookahead(&MaCrossover::new(5, 15, MaType::Ema));
}

#[test]
fn rsi_threshold_no_lookahead() {
    assert_signals_no_lookahead(&RsiThreshold::default());
}

#[test]
fn macd_crossover_no_lookahead() {
    assert_signals_no_lookahead(&MacdCrossover::default());
}

#[test]
fn buy_and_hold_no_lookahead() {
    assert_signals_no_lookahead(&BuyAndHold);
}
