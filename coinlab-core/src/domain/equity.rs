//! EquityPoint: per-bar snapshot of the simulated account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account state after the action on one bar.
///
/// `total_equity == cash + position_value` and
/// `position_value == units_held * close` for the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub cash: f64,
    pub units_held: f64,
    pub position_value: f64,
    pub total_equity: f64,
}

impl EquityPoint {
    pub fn is_flat(&self) -> bool {
        self.units_held == 0.0
    }
}

/// Extract the total equity column of a curve.
pub fn equity_values(curve: &[EquityPoint]) -> Vec<f64> {
    curve.iter().map(|p| p.total_equity).collect()
}
