//! Engine scenario tests through the public API.
//!
//! 1. Worked example (closes 100/110/105/120, 1% commission)
//! 2. Idempotent repeated signals
//! 3. Flat strategy round trip
//! 4. Fail-fast validation (shape, ordering, configuration, bad bars)
//! 5. Several round trips and trade statistics
//! 6. Numeric faults mid-run (overflowing units or equity)

use chrono::{Duration, TimeZone, Utc};
use coinlab_core::domain::{PriceBar, Signal, SignalSeries};
use coinlab_core::engine::{run_backtest, EngineConfig, EngineError};

fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                base + Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                (open.min(close) - 1.0).max(0.0),
                close,
                1000.0,
            )
        })
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── 1. Worked example ────────────────────────────────────────────────

#[test]
fn worked_example_ledger() {
    let bars = make_bars(&[100.0, 110.0, 105.0, 120.0]);
    let signals = SignalSeries::new(vec![Signal::Buy, Signal::Hold, Signal::Sell, Signal::Hold]);
    let config = EngineConfig::new(1000.0, 0.01, 1.0);

    let result = run_backtest(&bars, &signals, &config).unwrap();

    let trades = result.trades();
    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.entry_index, 0);
    assert_eq!(t.exit_index, Some(2));
    assert!(approx(t.units, 9.9));
    assert!(approx(t.entry_price, 100.0));
    assert_eq!(t.exit_price, Some(105.0));
    // 10 on entry + 10.395 on exit
    assert!(approx(t.commission, 20.395));
    assert!(approx(t.realized_pnl.unwrap(), 29.105));

    let m = result.metrics();
    assert!(approx(result.final_equity(), 1029.105));
    assert!(approx(m.total_return_pct, 2.9105));
    assert_eq!(m.trade_count, 1);
    assert_eq!(m.win_rate_pct, 100.0);
    // 1089 → 1029.105
    assert!(approx(m.max_drawdown_pct, (1089.0 - 1029.105) / 1089.0 * 100.0));
    assert!(approx(result.total_commission(), 20.395));
}

// ── 2. Idempotence ───────────────────────────────────────────────────

#[test]
fn repeated_signals_are_idempotent() {
    let bars = make_bars(&[100.0, 104.0, 98.0, 107.0, 111.0]);
    let config = EngineConfig::default();

    let noisy = SignalSeries::from_numeric(&[1, 1, 0, -1, -1]);
    let clean = SignalSeries::from_numeric(&[1, 0, 0, -1, 0]);

    let a = run_backtest(&bars, &noisy, &config).unwrap();
    let b = run_backtest(&bars, &clean, &config).unwrap();

    assert_eq!(a.trades(), b.trades());
    assert_eq!(a.equity_curve(), b.equity_curve());
    assert_eq!(a.metrics(), b.metrics());
}

#[test]
fn sell_while_flat_changes_nothing() {
    let bars = make_bars(&[100.0, 90.0, 80.0]);
    let result = run_backtest(
        &bars,
        &SignalSeries::from_numeric(&[-1, -1, -1]),
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(result.trades().is_empty());
    assert!(result
        .equity_curve()
        .iter()
        .all(|p| p.total_equity == 10_000.0));
}

// ── 3. Flat strategy ─────────────────────────────────────────────────

#[test]
fn all_hold_round_trip() {
    let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
    let bars = make_bars(&closes);
    let config = EngineConfig::default();

    let result = run_backtest(&bars, &SignalSeries::hold(bars.len()), &config).unwrap();

    assert!(result.trades().is_empty());
    assert_eq!(result.equity_curve().len(), 60);
    assert!(result
        .equity_curve()
        .iter()
        .all(|p| p.total_equity == config.initial_balance && p.is_flat()));
    let m = result.metrics();
    assert_eq!(m.total_return_pct, 0.0);
    assert_eq!(m.max_drawdown_pct, 0.0);
    assert_eq!(m.sharpe_ratio, 0.0);
    assert_eq!(m.win_rate_pct, 0.0);
    assert_eq!(m.trade_count, 0);
}

#[test]
fn empty_input_is_a_valid_run() {
    let result = run_backtest(&[], &SignalSeries::hold(0), &EngineConfig::default()).unwrap();
    assert!(result.equity_curve().is_empty());
    assert!(result.trades().is_empty());
    assert_eq!(result.final_equity(), 10_000.0);
    assert_eq!(result.metrics().total_return_pct, 0.0);
}

// ── 4. Fail-fast validation ──────────────────────────────────────────

#[test]
fn shape_mismatch() {
    let bars = make_bars(&[1.0, 2.0, 3.0]);
    let err = run_backtest(&bars, &SignalSeries::hold(2), &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::ShapeMismatch {
            bars: 3,
            signals: 2
        }
    ));
}

#[test]
fn unordered_timestamps() {
    let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
    bars[3].timestamp = bars[2].timestamp;
    let err = run_backtest(&bars, &SignalSeries::hold(4), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::UnorderedInput { index: 3 }));
}

#[test]
fn invalid_configuration() {
    let bars = make_bars(&[1.0, 2.0]);
    let signals = SignalSeries::hold(2);
    for config in [
        EngineConfig::new(0.0, 0.001, 1.0),
        EngineConfig::new(1000.0, 1.0, 1.0),
        EngineConfig::new(1000.0, -0.1, 1.0),
        EngineConfig::new(1000.0, 0.001, 0.0),
        EngineConfig::new(1000.0, 0.001, 1.5),
        EngineConfig::new(f64::NAN, 0.001, 1.0),
    ] {
        let err = run_backtest(&bars, &signals, &config).unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidConfiguration(_)),
            "{config:?} should be rejected"
        );
    }
}

#[test]
fn negative_price_is_invalid_bar() {
    let mut bars = make_bars(&[10.0, 11.0, 12.0]);
    bars[1].close = -1.0;
    let err = run_backtest(&bars, &SignalSeries::hold(3), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidBar { index: 1, .. }));
}

#[test]
fn nan_bar_is_invalid_bar() {
    let mut bars = make_bars(&[10.0, 11.0, 12.0]);
    bars[2].high = f64::NAN;
    let err = run_backtest(&bars, &SignalSeries::hold(3), &EngineConfig::default()).unwrap_err();
    assert_eq!(err.bar_index(), Some(2));
}

// ── 5. Multiple trades ───────────────────────────────────────────────

#[test]
fn two_round_trips_one_winner() {
    // win: 100 → 120, loss: 120 → 90
    let bars = make_bars(&[100.0, 120.0, 120.0, 90.0, 95.0]);
    let signals = SignalSeries::from_numeric(&[1, -1, 1, -1, 0]);
    let config = EngineConfig::new(1000.0, 0.0, 1.0);

    let result = run_backtest(&bars, &signals, &config).unwrap();
    let m = result.metrics();
    assert_eq!(m.trade_count, 2);
    assert_eq!(m.win_rate_pct, 50.0);
    assert!(approx(result.final_equity(), 1000.0 * 1.2 * 0.75));
    assert!(approx(m.total_return_pct, -10.0));
    assert!(result.trades().iter().all(|t| t.is_closed()));
}

#[test]
fn trade_count_matches_buy_sell_transitions() {
    let bars = make_bars(&[10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 12.0, 15.0]);
    let signals = SignalSeries::from_numeric(&[1, 0, -1, 1, 1, -1, 1, 0]);
    let result = run_backtest(&bars, &signals, &EngineConfig::default()).unwrap();

    // two completed, one trailing open
    assert_eq!(result.trades().len(), 3);
    assert_eq!(result.metrics().trade_count, 2);
    let open = result.open_trade().unwrap();
    assert_eq!(open.entry_index, 6);
    assert!(result.equity_curve().last().unwrap().units_held > 0.0);
}

// ── 6. Numeric faults ────────────────────────────────────────────────

#[test]
fn subnormal_close_overflows_unit_count() {
    // 9990 / 1e-310 exceeds f64::MAX.
    let bars = make_bars(&[1e-310, 1.0, 1.0]);
    let signals = SignalSeries::new(vec![Signal::Buy, Signal::Hold, Signal::Hold]);

    let err = run_backtest(&bars, &signals, &EngineConfig::default()).unwrap_err();
    match &err {
        EngineError::NumericFault { reason, .. } => assert!(reason.contains("unit count")),
        other => panic!("expected NumericFault, got {other:?}"),
    }
    assert_eq!(err.bar_index(), Some(0));
    let partial = err.partial_ledger().unwrap();
    assert!(partial.equity_curve.is_empty());
    assert!(partial.trades.is_empty());
}

#[test]
fn price_explosion_overflows_equity() {
    // ~1e304 units bought at 1e-300 are worth more than f64::MAX at 1e300.
    let bars = make_bars(&[1e-300, 1e300]);
    let signals = SignalSeries::new(vec![Signal::Buy, Signal::Hold]);

    let err = run_backtest(&bars, &signals, &EngineConfig::default()).unwrap_err();
    match &err {
        EngineError::NumericFault { reason, .. } => assert!(reason.contains("equity")),
        other => panic!("expected NumericFault, got {other:?}"),
    }
    assert_eq!(err.bar_index(), Some(1));
    let partial = err.partial_ledger().unwrap();
    assert_eq!(partial.equity_curve.len(), 1);
    assert!(partial.equity_curve[0].total_equity.is_finite());
    // The open trade from bar 0 is part of the partial ledger.
    assert_eq!(partial.trades.len(), 1);
    assert_eq!(partial.trades[0].entry_index, 0);
    assert!(partial.trades[0].exit_index.is_none());
}
