//! CoinLab Runner: backtest orchestration on top of `coinlab-core`.
//!
//! - TOML configuration and the strategy factory
//! - Bar loading through the configured provider and cache
//! - Single-run and parameter-sweep runners
//! - Text reports and artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod report;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, DataSection, RunId, StrategyConfig};
pub use data_loader::{dataset_hash, load_bars, DataSource, LoadedData};
pub use export::{load_artifacts, save_artifacts};
pub use fitness::FitnessMetric;
pub use report::{format_summary, format_sweep_table};
pub use runner::{
    run_backtest_on_bars, run_single_backtest, RunError, RunOutcome, SignalCounts, SCHEMA_VERSION,
};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
