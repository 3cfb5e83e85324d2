//! Discrete trade actions aligned 1:1 with price bars.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A BUY / SELL / HOLD decision for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Map the numeric convention 1 / -1 / 0 onto signals.
    ///
    /// Any positive value is a buy, any negative value a sell.
    pub fn from_numeric(value: i8) -> Self {
        match value.signum() {
            1 => Self::Buy,
            -1 => Self::Sell,
            _ => Self::Hold,
        }
    }

    pub fn to_numeric(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
            Self::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Ordered signal sequence, aligned index-for-index with a bar series.
///
/// Produced entirely before simulation begins and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalSeries(Vec<Signal>);

impl SignalSeries {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self(signals)
    }

    /// All-HOLD series of length `len`.
    pub fn hold(len: usize) -> Self {
        Self(vec![Signal::Hold; len])
    }

    pub fn from_numeric(values: &[i8]) -> Self {
        values.iter().copied().map(Signal::from_numeric).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Signal> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Signal] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.0.iter().copied()
    }

    /// Count of each signal kind as (buys, sells, holds).
    pub fn counts(&self) -> (usize, usize, usize) {
        self.0
            .iter()
            .fold((0, 0, 0), |(b, s, h), sig| match sig {
                Signal::Buy => (b + 1, s, h),
                Signal::Sell => (b, s + 1, h),
                Signal::Hold => (b, s, h + 1),
            })
    }

    pub fn into_inner(self) -> Vec<Signal> {
        self.0
    }
}

impl FromIterator<Signal> for SignalSeries {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Signal>> for SignalSeries {
    fn from(signals: Vec<Signal>) -> Self {
        Self(signals)
    }
}
