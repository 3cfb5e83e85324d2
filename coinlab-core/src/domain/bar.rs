//! PriceBar: one OHLCV observation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a single timestamp.
///
/// Bars are owned by the caller and borrowed by the engine for the duration
/// of a run. The engine never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Check the bar against the data model: finite, non-negative, and
    /// `low <= open, close <= high`.
    ///
    /// Returns a short reason on failure, suitable for an error message.
    pub fn check(&self) -> Result<(), String> {
        if self.has_non_finite() {
            return Err("non-finite OHLCV value".into());
        }
        if self.open < 0.0 || self.high < 0.0 || self.low < 0.0 || self.close < 0.0 {
            return Err("negative price".into());
        }
        if self.volume < 0.0 {
            return Err("negative volume".into());
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(format!(
                "high {} below max(open, close, low)",
                self.high
            ));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(format!("low {} above min(open, close, high)", self.low));
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.check().is_ok()
    }

    /// Typical price (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Extract the close column.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
