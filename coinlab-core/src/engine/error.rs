//! Engine error taxonomy.

use crate::domain::{EquityPoint, Trade};
use thiserror::Error;

/// Ledger built up to the faulting bar. Diagnostic only, never a valid result.
#[derive(Debug, Clone, Default)]
pub struct PartialLedger {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

/// Fatal conditions that abort a run. The engine never returns a partially
/// valid `BacktestResult`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("shape mismatch: {bars} bars but {signals} signals")]
    ShapeMismatch { bars: usize, signals: usize },

    #[error("timestamps not strictly increasing at bar {index}")]
    UnorderedInput { index: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid bar {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("numeric fault at bar {index}: {reason}")]
    NumericFault {
        index: usize,
        reason: String,
        partial: Box<PartialLedger>,
    },
}

impl EngineError {
    /// Bar index the error points at, if any.
    pub fn bar_index(&self) -> Option<usize> {
        match self {
            Self::UnorderedInput { index }
            | Self::InvalidBar { index, .. }
            | Self::NumericFault { index, .. } => Some(*index),
            Self::ShapeMismatch { .. } | Self::InvalidConfiguration(_) => None,
        }
    }

    /// The partial ledger of a numeric fault.
    pub fn partial_ledger(&self) -> Option<&PartialLedger> {
        match self {
            Self::NumericFault { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
