//! BacktestResult: the immutable output bundle of a run.

use serde::{Deserialize, Serialize};

use crate::domain::{EquityPoint, Trade};
use crate::metrics::Metrics;

use super::config::DEFAULT_PERIODS_PER_YEAR;

/// Relative tolerance when re-checking stored values.
const VERIFY_EPSILON: f64 = 1e-9;

/// Equity curve, trade log and metrics of a completed run.
///
/// Fields are private: downstream reporters read through accessors and
/// cannot mutate a result once the engine has built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    initial_balance: f64,
    #[serde(default = "default_periods_per_year")]
    periods_per_year: f64,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<Trade>,
    metrics: Metrics,
}

impl BacktestResult {
    pub(crate) fn new(
        initial_balance: f64,
        equity_curve: Vec<EquityPoint>,
        trades: Vec<Trade>,
        periods_per_year: f64,
    ) -> Self {
        let metrics = Metrics::compute(&equity_curve, &trades, initial_balance, periods_per_year);
        Self {
            initial_balance,
            periods_per_year,
            equity_curve,
            trades,
            metrics,
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// One point per input bar, in bar order.
    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Closed trades in order, followed by the trailing open trade if the run
    /// ended while holding.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        self.trades.last().filter(|t| !t.is_closed())
    }

    /// Total equity at the last bar, or the initial balance for an empty run.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.total_equity)
            .unwrap_or(self.initial_balance)
    }

    /// Sharpe annualization factor the metrics were computed with.
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    /// Re-check a result that did not come straight from the engine, e.g.
    /// one loaded from disk: every equity point must satisfy
    /// `total_equity == cash + position_value`, and the stored metrics must
    /// match a recomputation from the curve and trade log.
    pub fn verify(&self) -> Result<(), String> {
        for p in &self.equity_curve {
            if !close_enough(p.total_equity, p.cash + p.position_value) {
                return Err(format!(
                    "equity point {} does not balance: {} != {} + {}",
                    p.index, p.total_equity, p.cash, p.position_value
                ));
            }
        }

        let expected = Metrics::compute(
            &self.equity_curve,
            &self.trades,
            self.initial_balance,
            self.periods_per_year,
        );
        let m = &self.metrics;
        let fields = [
            ("total_return_pct", m.total_return_pct, expected.total_return_pct),
            ("sharpe_ratio", m.sharpe_ratio, expected.sharpe_ratio),
            ("max_drawdown_pct", m.max_drawdown_pct, expected.max_drawdown_pct),
            ("win_rate_pct", m.win_rate_pct, expected.win_rate_pct),
        ];
        for (name, stored, recomputed) in fields {
            if !close_enough(stored, recomputed) {
                return Err(format!(
                    "metric {name} is {stored}, ledger gives {recomputed}"
                ));
            }
        }
        if m.trade_count != expected.trade_count {
            return Err(format!(
                "trade_count is {}, ledger gives {}",
                m.trade_count, expected.trade_count
            ));
        }
        Ok(())
    }

    /// Total commission paid across all trades, open ones included.
    pub fn total_commission(&self) -> f64 {
        self.trades.iter().map(|t| t.commission).sum()
    }
}

fn default_periods_per_year() -> f64 {
    DEFAULT_PERIODS_PER_YEAR
}

fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= VERIFY_EPSILON * a.abs().max(b.abs()).max(1.0)
}
