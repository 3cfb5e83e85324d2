//! The bar loop: one decision per bar, no look-ahead.

use tracing::{debug, info};

use crate::domain::{EquityPoint, PriceBar, Signal, SignalSeries};

use super::config::EngineConfig;
use super::error::{EngineError, PartialLedger};
use super::result::BacktestResult;
use super::state::PositionState;
use super::validate::validate_inputs;

/// Replay `signals` against `bars` and build the ledger and metrics.
///
/// Each bar's signal executes at that bar's close:
/// - BUY while flat allocates `cash * position_size_fraction`, commission
///   included, and opens a trade. A buy that would yield no units is skipped.
/// - SELL while long liquidates the whole position and closes the trade.
/// - Anything else (HOLD, BUY while long, SELL while flat) changes nothing.
///
/// The result is a pure function of the inputs. Malformed input fails before
/// any state is created; a numeric fault aborts the run.
pub fn run_backtest(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &EngineConfig,
) -> Result<BacktestResult, EngineError> {
    validate_inputs(bars, signals, config)?;

    let mut state = PositionState::new(config.initial_balance);
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut skipped_buys = 0usize;
    let mut ignored = 0usize;

    for (index, (bar, signal)) in bars.iter().zip(signals.iter()).enumerate() {
        match signal {
            Signal::Buy if state.is_flat() => {
                let spend = state.cash * config.position_size_fraction;
                let commission = spend * config.commission_rate;
                if bar.close <= 0.0 {
                    return Err(fault(index, "BUY at non-positive close", &state, equity_curve));
                }
                let units = (spend - commission) / bar.close;
                if !units.is_finite() {
                    return Err(fault(index, "non-finite unit count", &state, equity_curve));
                }
                if units > 0.0 {
                    state.enter(index, bar, spend, commission, units);
                } else {
                    skipped_buys += 1;
                    debug!(bar = index, cash = state.cash, "buy skipped: insufficient capital");
                }
            }
            Signal::Sell if state.is_long() => {
                let proceeds = state.units_held * bar.close;
                let commission = proceeds * config.commission_rate;
                state.exit(index, bar, proceeds, commission);
            }
            Signal::Buy | Signal::Sell => ignored += 1,
            Signal::Hold => {}
        }

        let point = state.snapshot(index, bar);
        if !point.total_equity.is_finite() {
            return Err(fault(index, "non-finite equity", &state, equity_curve));
        }
        equity_curve.push(point);
    }

    let trades = state.into_trade_log();
    let result = BacktestResult::new(
        config.initial_balance,
        equity_curve,
        trades,
        config.periods_per_year,
    );

    info!(
        bars = bars.len(),
        trades = result.metrics().trade_count,
        skipped_buys,
        ignored_signals = ignored,
        total_return_pct = result.metrics().total_return_pct,
        "backtest complete"
    );

    Ok(result)
}

fn fault(
    index: usize,
    reason: &str,
    state: &PositionState,
    equity_curve: Vec<EquityPoint>,
) -> EngineError {
    EngineError::NumericFault {
        index,
        reason: reason.to_string(),
        partial: Box::new(PartialLedger {
            equity_curve,
            trades: state.trade_log(),
        }),
    }
}
