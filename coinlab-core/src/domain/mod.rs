//! Domain types for CoinLab.

pub mod bar;
pub mod equity;
pub mod signal;
pub mod trade;

pub use bar::PriceBar;
pub use equity::EquityPoint;
pub use signal::{Signal, SignalSeries};
pub use trade::Trade;
