//! Stochastic Oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over
//! `k_period` bars; %D = SMA(d_period) of %K.
//! A flat window (highest_high == lowest_low) yields `NaN`.

use super::rolling_mean;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLines {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        assert!(k_period >= 1 && d_period >= 1, "Stochastic periods must be >= 1");
        Self { k_period, d_period }
    }

    pub fn compute(&self, bars: &[PriceBar]) -> StochasticLines {
        let n = bars.len();
        let mut k = vec![f64::NAN; n];

        if n >= self.k_period {
            for i in (self.k_period - 1)..n {
                let window = &bars[i + 1 - self.k_period..=i];
                let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                let range = highest - lowest;
                if range > 0.0 {
                    k[i] = 100.0 * (bars[i].close - lowest) / range;
                }
            }
        }

        let d = rolling_mean(&k, self.d_period);
        StochasticLines { k, d }
    }
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new(14, 3)
    }
}
