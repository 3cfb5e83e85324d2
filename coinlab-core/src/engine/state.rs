//! Mutable per-run position state.

use crate::domain::{EquityPoint, PriceBar, Trade};

/// Cash and position for one run. Exactly one exists per run and the engine
/// owns it exclusively; it never outlives `run_backtest`.
#[derive(Debug, Clone)]
pub struct PositionState {
    pub cash: f64,
    pub units_held: f64,
    /// Valid only while `units_held > 0`. Bookkeeping only; PnL is mark-to-market.
    pub entry_price: Option<f64>,
    open_trade: Option<Trade>,
    closed: Vec<Trade>,
}

impl PositionState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            cash: initial_balance,
            units_held: 0.0,
            entry_price: None,
            open_trade: None,
            closed: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.units_held == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.units_held > 0.0
    }

    /// Enter a long position. `spend` leaves cash in full; `commission` is
    /// part of it, not an extra deduction.
    pub(crate) fn enter(
        &mut self,
        index: usize,
        bar: &PriceBar,
        spend: f64,
        commission: f64,
        units: f64,
    ) {
        self.cash -= spend;
        self.units_held = units;
        self.entry_price = Some(bar.close);
        self.open_trade = Some(Trade::open(
            index,
            bar.timestamp,
            bar.close,
            spend,
            units,
            commission,
        ));
    }

    /// Liquidate the whole position at the bar close.
    pub(crate) fn exit(&mut self, index: usize, bar: &PriceBar, proceeds: f64, commission: f64) {
        let net = proceeds - commission;
        self.cash += net;
        self.units_held = 0.0;
        self.entry_price = None;
        if let Some(mut trade) = self.open_trade.take() {
            trade.close(index, bar.timestamp, bar.close, commission, net);
            self.closed.push(trade);
        }
    }

    /// Mark to market at the bar close.
    pub(crate) fn snapshot(&self, index: usize, bar: &PriceBar) -> EquityPoint {
        let position_value = self.units_held * bar.close;
        EquityPoint {
            index,
            timestamp: bar.timestamp,
            close: bar.close,
            cash: self.cash,
            units_held: self.units_held,
            position_value,
            total_equity: self.cash + position_value,
        }
    }

    /// Closed trades followed by the still-open trade, if any.
    pub(crate) fn trade_log(&self) -> Vec<Trade> {
        let mut log = self.closed.clone();
        log.extend(self.open_trade.iter().cloned());
        log
    }

    pub(crate) fn into_trade_log(self) -> Vec<Trade> {
        let mut log = self.closed;
        log.extend(self.open_trade);
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar::new(
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            close,
            close,
            close,
            close,
            0.0,
        )
    }

    #[test]
    fn enter_and_exit_round_trip() {
        let mut state = PositionState::new(1000.0);
        assert!(state.is_flat());

        state.enter(0, &bar(1, 100.0), 1000.0, 10.0, 9.9);
        assert!(state.is_long());
        assert_eq!(state.cash, 0.0);
        assert_eq!(state.entry_price, Some(100.0));
        assert_eq!(state.trade_log().len(), 1);

        state.exit(2, &bar(3, 105.0), 1039.5, 10.395);
        assert!(state.is_flat());
        assert_eq!(state.entry_price, None);
        assert!((state.cash - 1029.105).abs() < 1e-9);

        let log = state.into_trade_log();
        assert_eq!(log.len(), 1);
        assert!(log[0].is_closed());
    }

    #[test]
    fn snapshot_marks_to_market() {
        let mut state = PositionState::new(1000.0);
        state.enter(0, &bar(1, 100.0), 500.0, 0.0, 5.0);
        let point = state.snapshot(1, &bar(2, 120.0));
        assert_eq!(point.cash, 500.0);
        assert_eq!(point.position_value, 600.0);
        assert_eq!(point.total_equity, 1100.0);
    }

    #[test]
    fn open_trade_trails_the_log() {
        let mut state = PositionState::new(1000.0);
        state.enter(0, &bar(1, 100.0), 1000.0, 0.0, 10.0);
        state.exit(1, &bar(2, 110.0), 1100.0, 0.0);
        state.enter(2, &bar(3, 100.0), 1100.0, 0.0, 11.0);

        let log = state.into_trade_log();
        assert_eq!(log.len(), 2);
        assert!(log[0].is_closed());
        assert!(!log[1].is_closed());
    }
}
