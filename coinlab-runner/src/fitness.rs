//! Fitness function: configurable metric selector for strategy ranking.

use std::fmt;
use std::str::FromStr;

use coinlab_core::metrics::Metrics;
use serde::{Deserialize, Serialize};

/// Which metric to optimize/sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    TotalReturn,
    #[default]
    Sharpe,
    MaxDrawdown,
    WinRate,
}

impl FitnessMetric {
    pub const ALL: [FitnessMetric; 4] = [
        Self::TotalReturn,
        Self::Sharpe,
        Self::MaxDrawdown,
        Self::WinRate,
    ];

    /// Extract the relevant metric value.
    pub fn extract(&self, metrics: &Metrics) -> f64 {
        match self {
            Self::TotalReturn => metrics.total_return_pct,
            Self::Sharpe => metrics.sharpe_ratio,
            Self::MaxDrawdown => metrics.max_drawdown_pct,
            Self::WinRate => metrics.win_rate_pct,
        }
    }

    /// Whether higher values are better for this metric.
    ///
    /// Drawdown is reported as a positive percentage, so lower is better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// Returns true if `a` is strictly better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }

    /// Ordering with the best value first.
    pub fn compare(&self, a: f64, b: f64) -> std::cmp::Ordering {
        let ord = a.total_cmp(&b);
        if self.is_higher_better() {
            ord.reverse()
        } else {
            ord
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalReturn => "total_return",
            Self::Sharpe => "sharpe",
            Self::MaxDrawdown => "max_drawdown",
            Self::WinRate => "win_rate",
        }
    }
}

impl fmt::Display for FitnessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitnessMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.replace('-', "_"))
            .ok_or_else(|| {
                format!(
                    "unknown fitness metric '{s}' \
                     (expected total_return, sharpe, max_drawdown or win_rate)"
                )
            })
    }
}
