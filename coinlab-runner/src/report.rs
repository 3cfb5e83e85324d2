//! Plain-text reports: the run summary and the sweep leaderboard.

use std::fmt::Write;

use crate::fitness::FitnessMetric;
use crate::runner::RunOutcome;
use crate::sweep::SweepResults;

const RULE_WIDTH: usize = 50;

/// The results block printed after a single backtest.
///
/// ```text
/// ==================================================
/// BACKTEST RESULTS
/// ==================================================
/// Initial Balance: $10,000.00
/// Final Balance: $11,234.56
/// Total Return: 12.35%
/// ...
/// ```
pub fn format_summary(outcome: &RunOutcome) -> String {
    let result = &outcome.result;
    let m = result.metrics();
    let rule = "=".repeat(RULE_WIDTH);

    let mut out = String::with_capacity(512);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "BACKTEST RESULTS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Strategy: {}", outcome.strategy.label());
    let _ = writeln!(out, "Symbol: {} ({} bars)", outcome.symbol, outcome.bar_count);
    if outcome.has_synthetic {
        let _ = writeln!(out, "Data: SYNTHETIC");
    }
    let _ = writeln!(out, "Initial Balance: ${}", format_money(result.initial_balance()));
    let _ = writeln!(out, "Final Balance: ${}", format_money(result.final_equity()));
    let _ = writeln!(out, "Total Return: {:.2}%", m.total_return_pct);
    let _ = writeln!(out, "Sharpe Ratio: {:.2}", m.sharpe_ratio);
    let _ = writeln!(out, "Max Drawdown: {:.2}%", m.max_drawdown_pct);
    let _ = writeln!(out, "Win Rate: {:.2}%", m.win_rate_pct);
    let _ = writeln!(out, "Total Trades: {}", m.trade_count);
    let _ = writeln!(out, "{rule}");
    out
}

/// One line per trade: entry, exit (or `open`), units and realized PnL.
pub fn format_trade_log(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for (n, t) in outcome.result.trades().iter().enumerate() {
        let entry = t.entry_timestamp.format("%Y-%m-%d");
        match (t.exit_timestamp, t.exit_price, t.realized_pnl) {
            (Some(exit_ts), Some(exit_price), Some(pnl)) => {
                let _ = writeln!(
                    out,
                    "#{:<3} {entry} @ {:.2} -> {} @ {:.2}  units {:.6}  pnl {:+.2}",
                    n + 1,
                    t.entry_price,
                    exit_ts.format("%Y-%m-%d"),
                    exit_price,
                    t.units,
                    pnl,
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "#{:<3} {entry} @ {:.2} -> open  units {:.6}",
                    n + 1,
                    t.entry_price,
                    t.units,
                );
            }
        }
    }
    out
}

/// Ranked sweep table, best first by `metric`, at most `limit` rows.
pub fn format_sweep_table(results: &SweepResults, metric: FitnessMetric, limit: usize) -> String {
    let mut out = String::with_capacity(128 * limit.min(results.len()) + 256);
    let _ = writeln!(
        out,
        "{:>4}  {:<32} {:>10} {:>8} {:>8} {:>8} {:>7}",
        "rank", "strategy", "return%", "sharpe", "maxdd%", "win%", "trades"
    );
    for (rank, outcome) in results.top_n(metric, limit).into_iter().enumerate() {
        let m = outcome.result.metrics();
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {:>10.2} {:>8.2} {:>8.2} {:>8.2} {:>7}",
            rank + 1,
            outcome.strategy.label(),
            m.total_return_pct,
            m.sharpe_ratio,
            m.max_drawdown_pct,
            m.win_rate_pct,
            m.trade_count,
        );
    }
    let _ = writeln!(out, "ranked by {metric} ({} runs)", results.len());
    out
}

/// Two decimals with `,` thousands separators: `1234567.891` → `1,234,567.89`.
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
