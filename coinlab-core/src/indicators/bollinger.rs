//! Bollinger Bands.
//!
//! middle = SMA(period); upper/lower = middle ± num_std * rolling sample std.
//! Lookback: period - 1.

use super::{rolling_mean, rolling_std};
use crate::domain::bar::closes;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    num_std: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl Bollinger {
    pub fn new(period: usize, num_std: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        assert!(num_std.is_finite() && num_std > 0.0, "Bollinger width must be positive");
        Self { period, num_std }
    }

    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    pub fn compute(&self, bars: &[PriceBar]) -> BollingerBands {
        let close = closes(bars);
        let middle = rolling_mean(&close, self.period);
        let std = rolling_std(&close, self.period);

        let upper = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m + self.num_std * s)
            .collect();
        let lower = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m - self.num_std * s)
            .collect();

        BollingerBands {
            upper,
            middle,
            lower,
        }
    }
}

impl Default for Bollinger {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}
