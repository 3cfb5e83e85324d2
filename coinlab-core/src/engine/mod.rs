//! Trade engine: replays a signal series against price bars.
//!
//! Single pass, one decision per bar, executed at the bar close:
//!
//! 1. Validate configuration, shape, ordering and bars (no partial runs)
//! 2. For each bar, apply the signal to the position state
//! 3. Mark to market and append an equity point
//! 4. Bundle curve, trade log and metrics into a `BacktestResult`

pub mod config;
pub mod error;
pub mod loop_runner;
pub mod result;
pub mod state;
pub mod validate;

pub use config::EngineConfig;
pub use error::{EngineError, PartialLedger};
pub use loop_runner::run_backtest;
pub use result::BacktestResult;
pub use state::PositionState;
pub use validate::validate_inputs;
