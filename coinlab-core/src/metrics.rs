//! Performance metrics: pure functions from the ledger to summary statistics.
//!
//! Degenerate inputs (flat equity, no trades, too few bars) never error; each
//! metric falls back to a documented default, and every field of `Metrics` is
//! finite.

use serde::{Deserialize, Serialize};

use crate::domain::equity::equity_values;
use crate::domain::{EquityPoint, Trade};

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-15;

/// Summary statistics for one backtest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    /// Closed trades only; a trailing open trade is excluded.
    pub trade_count: usize,
}

impl Metrics {
    /// Compute all metrics from an equity curve and trade log.
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_balance: f64,
        periods_per_year: f64,
    ) -> Self {
        let equity = equity_values(equity_curve);
        Self {
            total_return_pct: finite_or_zero(total_return_pct(&equity, initial_balance)),
            sharpe_ratio: finite_or_zero(sharpe_ratio(&equity, periods_per_year)),
            max_drawdown_pct: finite_or_zero(max_drawdown_pct(&equity)),
            win_rate_pct: finite_or_zero(win_rate_pct(trades)),
            trade_count: closed_trade_count(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `(final / initial - 1) * 100`. An empty curve ends where it started.
pub fn total_return_pct(equity: &[f64], initial_balance: f64) -> f64 {
    if initial_balance <= 0.0 {
        return 0.0;
    }
    let final_equity = equity.last().copied().unwrap_or(initial_balance);
    (final_equity / initial_balance - 1.0) * 100.0
}

/// Simple per-bar returns. A bar whose predecessor has zero equity is skipped.
pub fn per_bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Annualized Sharpe ratio: `mean(r) / std(r) * sqrt(periods_per_year)`.
///
/// Returns 0.0 with fewer than two returns or zero deviation.
pub fn sharpe_ratio(equity: &[f64], periods_per_year: f64) -> f64 {
    let returns = per_bar_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if !std.is_finite() || std < STD_EPSILON {
        return 0.0;
    }
    mean(&returns) / std * periods_per_year.sqrt()
}

/// Largest peak-to-trough decline as a positive percentage (25.0 = 25%).
///
/// Returns 0.0 for curves with fewer than two points.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    drawdown_series(equity)
        .into_iter()
        .fold(0.0_f64, f64::max)
}

/// Per-bar drawdown from the running peak, as positive percentages.
///
/// Empty for curves with fewer than two points. Bars before the first
/// positive peak report 0.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    if equity.len() < 2 {
        return Vec::new();
    }
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&eq| {
            peak = peak.max(eq);
            if peak > 0.0 {
                (peak - eq) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Percentage of closed trades with positive realized PnL; 0 with none closed.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    let closed = closed_trade_count(trades);
    if closed == 0 {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / closed as f64 * 100.0
}

pub fn closed_trade_count(trades: &[Trade]) -> usize {
    trades.iter().filter(|t| t.is_closed()).count()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
