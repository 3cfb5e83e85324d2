//! Backtest runner: wires together strategy, data, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads bars per `[data]`, then runs. Used by CLI.
//! - `run_backtest_on_bars()`: takes pre-loaded bars. Used by sweeps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info_span;

use coinlab_core::data::{CacheStore, DataError};
use coinlab_core::domain::PriceBar;
use coinlab_core::engine::{run_backtest, BacktestResult, EngineConfig, EngineError};

use crate::config::{BacktestConfig, ConfigError, StrategyConfig};
use crate::data_loader::{load_bars, DataSource};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-direction signal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Config hash when the run came from a `BacktestConfig`.
    pub run_id: Option<String>,
    pub strategy: StrategyConfig,
    pub symbol: String,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub signal_counts: SignalCounts,
    pub dataset_hash: Option<String>,
    pub has_synthetic: bool,
    pub result: BacktestResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunOutcome {
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

/// Run a strategy over pre-loaded bars. Performs no I/O.
pub fn run_backtest_on_bars(
    symbol: &str,
    bars: &[PriceBar],
    strategy: &StrategyConfig,
    engine_config: &EngineConfig,
) -> Result<RunOutcome, RunError> {
    let span = info_span!("backtest", symbol, strategy = %strategy.label());
    let _guard = span.enter();

    let source = strategy.build()?;
    let signals = source.generate(bars);
    let (buys, sells, holds) = signals.counts();
    let result = run_backtest(bars, &signals, engine_config)?;

    Ok(RunOutcome {
        schema_version: SCHEMA_VERSION,
        run_id: None,
        strategy: strategy.clone(),
        symbol: symbol.to_string(),
        bar_count: bars.len(),
        warmup_bars: source.warmup_bars(),
        signal_counts: SignalCounts { buys, sells, holds },
        dataset_hash: None,
        has_synthetic: false,
        result,
    })
}

/// Run a backtest from a `BacktestConfig`, loading bars per its `[data]` section.
pub fn run_single_backtest(
    config: &BacktestConfig,
    cache: Option<Arc<dyn CacheStore>>,
) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let run_id = config.run_id();
    let span = info_span!("run", run_id = %&run_id[..12]);
    let _guard = span.enter();

    let loaded = load_bars(&config.data, cache)?;
    let mut outcome = run_backtest_on_bars(
        &config.data.symbol,
        &loaded.bars,
        &config.strategy,
        &config.to_engine_config(),
    )?;
    outcome.run_id = Some(run_id);
    outcome.dataset_hash = Some(loaded.dataset_hash);
    outcome.has_synthetic = loaded.source == DataSource::Synthetic;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSection;
    use coinlab_core::data::{BarProvider, FetchRequest, MemoryCache, SyntheticProvider};

    fn synthetic_config(strategy: StrategyConfig) -> BacktestConfig {
        BacktestConfig {
            strategy,
            data: DataSection {
                synthetic: true,
                synthetic_bars: 200,
                ..DataSection::default()
            },
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn single_backtest_on_synthetic_data() {
        let config = synthetic_config(StrategyConfig::default());
        let outcome = run_single_backtest(&config, None).unwrap();

        assert_eq!(outcome.bar_count, 200);
        assert_eq!(outcome.result.equity_curve().len(), 200);
        assert_eq!(outcome.run_id.as_deref(), Some(config.run_id().as_str()));
        assert!(outcome.has_synthetic);
        assert!(outcome.dataset_hash.is_some());
        let c = outcome.signal_counts;
        assert_eq!(c.buys + c.sells + c.holds, 200);
    }

    #[test]
    fn buy_and_hold_opens_once() {
        let config = synthetic_config(StrategyConfig::BuyAndHold);
        let outcome = run_single_backtest(&config, Some(Arc::new(MemoryCache::new()))).unwrap();
        assert_eq!(outcome.signal_counts.buys, 1);
        assert_eq!(outcome.result.trades().len(), 1);
        assert!(outcome.result.open_trade().is_some());
        assert_eq!(outcome.result.metrics().trade_count, 0);
    }

    #[test]
    fn invalid_strategy_is_config_error() {
        let config = synthetic_config(StrategyConfig::MacdCrossover {
            fast: 30,
            slow: 10,
            signal: 9,
        });
        assert!(matches!(
            run_single_backtest(&config, None),
            Err(RunError::Config(ConfigError::InvalidStrategy(_)))
        ));
    }

    #[test]
    fn engine_errors_propagate() {
        let mut bars = SyntheticProvider::new(10)
            .fetch(&FetchRequest::new("X/Y", "1d"))
            .unwrap();
        bars.swap(3, 4);
        let err = run_backtest_on_bars(
            "X/Y",
            &bars,
            &StrategyConfig::BuyAndHold,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RunError::Engine(EngineError::UnorderedInput { index: 4 })
        ));
    }
}
