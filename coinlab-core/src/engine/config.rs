//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::error::EngineError;

pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;
pub const DEFAULT_POSITION_SIZE_FRACTION: f64 = 1.0;
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Parameters for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Proportional fee on trade notional, charged at entry and exit. In [0, 1).
    pub commission_rate: f64,
    /// Fraction of cash allocated per entry. In (0, 1].
    pub position_size_fraction: f64,
    /// Annualization factor for the Sharpe ratio (bars per year).
    pub periods_per_year: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            commission_rate: DEFAULT_COMMISSION_RATE,
            position_size_fraction: DEFAULT_POSITION_SIZE_FRACTION,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_balance: f64, commission_rate: f64, position_size_fraction: f64) -> Self {
        Self {
            initial_balance,
            commission_rate,
            position_size_fraction,
            ..Self::default()
        }
    }

    pub fn with_periods_per_year(mut self, periods_per_year: f64) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "initial balance must be positive and finite, got {}",
                self.initial_balance
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(EngineError::InvalidConfiguration(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        if !(self.position_size_fraction > 0.0 && self.position_size_fraction <= 1.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "position size fraction must be in (0, 1], got {}",
                self.position_size_fraction
            )));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "periods per year must be positive and finite, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}
