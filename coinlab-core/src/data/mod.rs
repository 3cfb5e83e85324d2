//! Bar loading and caching.
//!
//! Providers produce `PriceBar` series; the cache sits above them and never
//! knows where bars came from. Nothing here talks to the network.

pub mod cache;
pub mod csv_io;
pub mod provider;

pub use cache::{cache_key, CacheInfo, CacheStore, FileCache, MemoryCache};
pub use csv_io::{load_bars_csv, read_bars_csv, write_bars_csv};
pub use provider::{
    parse_timeframe, BarProvider, CachedProvider, CsvDirProvider, FetchRequest, SyntheticProvider,
};

use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid timestamp '{value}' in row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("unsupported timeframe '{0}' (expected e.g. 1m, 15m, 4h, 1d, 1w)")]
    InvalidTimeframe(String),

    #[error("no data for {symbol} ({timeframe})")]
    NoData { symbol: String, timeframe: String },

    #[error("cache error: {0}")]
    CacheError(String),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}
