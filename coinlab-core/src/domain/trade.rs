//! Trade: an append-only round-trip record, open until a SELL closes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A long round trip: created by a BUY while flat, finalized by a SELL while
/// holding. Exit fields stay `None` while the trade is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    /// Cash allocated at entry, commission included.
    pub entry_spend: f64,

    // ── Exit ──
    pub exit_index: Option<usize>,
    pub exit_timestamp: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,

    // ── Size ──
    pub units: f64,

    // ── PnL ──
    /// Entry commission, plus exit commission once closed.
    pub commission: f64,
    /// `(proceeds - exit commission) - entry_spend`.
    pub realized_pnl: Option<f64>,
}

impl Trade {
    pub(crate) fn open(
        entry_index: usize,
        entry_timestamp: DateTime<Utc>,
        entry_price: f64,
        entry_spend: f64,
        units: f64,
        commission: f64,
    ) -> Self {
        Self {
            entry_index,
            entry_timestamp,
            entry_price,
            entry_spend,
            exit_index: None,
            exit_timestamp: None,
            exit_price: None,
            units,
            commission,
            realized_pnl: None,
        }
    }

    /// Finalize an open trade. `net_proceeds` is after the exit commission.
    pub(crate) fn close(
        &mut self,
        exit_index: usize,
        exit_timestamp: DateTime<Utc>,
        exit_price: f64,
        exit_commission: f64,
        net_proceeds: f64,
    ) {
        self.exit_index = Some(exit_index);
        self.exit_timestamp = Some(exit_timestamp);
        self.exit_price = Some(exit_price);
        self.commission += exit_commission;
        self.realized_pnl = Some(net_proceeds - self.entry_spend);
    }

    pub fn is_closed(&self) -> bool {
        self.realized_pnl.is_some()
    }

    /// Closed with positive realized PnL. Open trades are never winners.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl.is_some_and(|pnl| pnl > 0.0)
    }

    /// Realized return as a fraction of the entry spend.
    pub fn return_pct(&self) -> Option<f64> {
        if self.entry_spend == 0.0 {
            return None;
        }
        self.realized_pnl.map(|pnl| pnl / self.entry_spend)
    }

    pub fn bars_held(&self) -> Option<usize> {
        self.exit_index.map(|exit| exit - self.entry_index)
    }
}
