//! CoinLab Core: domain types, backtest engine, metrics, indicators, signals, data.
//!
//! This crate contains the simulation itself:
//! - Domain types (price bars, signals, trades, equity points)
//! - Single-pass, all-in/all-out long-only backtest loop
//! - Performance metrics (return, Sharpe, drawdown, win rate)
//! - Technical indicators and the signal sources built on them
//! - Bar loading and caching (CSV files, file/memory cache, synthetic data)
//!
//! Nothing in this crate performs network I/O.

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod signals;

pub use domain::{EquityPoint, PriceBar, Signal, SignalSeries, Trade};
pub use engine::{run_backtest, BacktestResult, EngineConfig, EngineError};
pub use metrics::Metrics;


#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result and config types can cross thread boundaries,
    /// which parameter sweeps rely on.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::SignalSeries>();
        require_sync::<domain::SignalSeries>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();
        require_send::<domain::EquityPoint>();
        require_sync::<domain::EquityPoint>();

        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::BacktestResult>();
        require_sync::<engine::BacktestResult>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();

        require_send::<indicators::IndicatorValues>();
        require_sync::<indicators::IndicatorValues>();
        require_send::<signals::MaCrossover>();
        require_sync::<signals::MaCrossover>();
        require_send::<signals::RsiThreshold>();
        require_sync::<signals::RsiThreshold>();
        require_send::<signals::MacdCrossover>();
        require_sync::<signals::MacdCrossover>();
        require_send::<signals::BuyAndHold>();
        require_sync::<signals::BuyAndHold>();

        require_send::<data::FileCache>();
        require_sync::<data::FileCache>();
        require_send::<data::MemoryCache>();
        require_sync::<data::MemoryCache>();
    }

    /// Signal sources see only bars; they never see engine state.
    #[test]
    fn signal_source_has_no_position_parameter() {
        fn _check_trait_object_builds(
            source: &dyn signals::SignalSource,
            bars: &[domain::PriceBar],
        ) -> domain::SignalSeries {
            source.generate(bars)
        }
    }
}
