//! Bar providers.
//!
//! The `BarProvider` trait abstracts over bar sources (CSV directory,
//! synthetic random walk) so runners can swap them and tests can mock them.
//! `CachedProvider` layers a `CacheStore` over any provider; providers
//! themselves know nothing about the cache.

use super::cache::{cache_key, CacheStore};
use super::csv_io::load_bars_csv;
use super::DataError;
use crate::domain::PriceBar;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One bar-series request: trading pair, timeframe, optional window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub symbol: String,
    pub timeframe: String,
    /// Earliest bar timestamp, epoch milliseconds.
    pub since: Option<i64>,
    /// Maximum number of bars.
    pub limit: Option<usize>,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            since: None,
            limit: None,
        }
    }

    pub fn with_since(mut self, since_ms: i64) -> Self {
        self.since = Some(since_ms);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cache_key(&self) -> String {
        cache_key(&self.symbol, &self.timeframe, self.since, self.limit)
    }

    /// Apply `since` and `limit` to an in-order bar series.
    fn window(&self, bars: Vec<PriceBar>) -> Vec<PriceBar> {
        let iter = bars.into_iter().filter(|b| match self.since {
            Some(since) => b.timestamp.timestamp_millis() >= since,
            None => true,
        });
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Trait for bar sources.
pub trait BarProvider: Send + Sync {
    /// Human-readable name; also the cache namespace.
    fn name(&self) -> &str;

    /// Identifies the bar stream for caching. Two providers with the same
    /// scope must return the same bars for the same request.
    fn cache_scope(&self) -> String {
        self.name().to_string()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError>;
}

impl<P: BarProvider + ?Sized> BarProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn cache_scope(&self) -> String {
        (**self).cache_scope()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError> {
        (**self).fetch(request)
    }
}

/// Parse a timeframe such as `1m`, `15m`, `4h`, `1d`, `1w` into a bar duration.
pub fn parse_timeframe(timeframe: &str) -> Result<Duration, DataError> {
    let invalid = || DataError::InvalidTimeframe(timeframe.to_string());
    let split = timeframe
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (count, unit) = timeframe.split_at(split);
    let count: i64 = count.parse().map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    match unit {
        "m" => Ok(Duration::minutes(count)),
        "h" => Ok(Duration::hours(count)),
        "d" => Ok(Duration::days(count)),
        "w" => Ok(Duration::weeks(count)),
        _ => Err(invalid()),
    }
}

// ─── CSV directory ──────────────────────────────────────────────────

/// Reads `{dir}/{SYMBOL}_{timeframe}.csv`, with `/` in the symbol replaced by `-`
/// (`BTC/USDT` + `1d` → `BTC-USDT_1d.csv`).
#[derive(Debug, Clone)]
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: &str) -> PathBuf {
        let file_symbol = symbol.replace('/', "-");
        self.dir.join(format!("{file_symbol}_{timeframe}.csv"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BarProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn cache_scope(&self) -> String {
        format!("csv:{}", self.dir.display())
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError> {
        let path = self.path_for(&request.symbol, &request.timeframe);
        if !path.exists() {
            return Err(DataError::NoData {
                symbol: request.symbol.clone(),
                timeframe: request.timeframe.clone(),
            });
        }
        let bars = load_bars_csv(&path)?;
        Ok(request.window(bars))
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk bars.
///
/// The RNG is seeded from a BLAKE3 hash of `(symbol, timeframe)`, so the same
/// request always yields the same series and different pairs differ.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    default_bars: usize,
    start_price: f64,
}

impl SyntheticProvider {
    pub const DEFAULT_BARS: usize = 365;
    /// 2024-01-01T00:00:00Z, used when the request has no `since`.
    pub const DEFAULT_START_MS: i64 = 1_704_067_200_000;

    pub fn new(default_bars: usize) -> Self {
        Self {
            default_bars,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    fn seed(symbol: &str, timeframe: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(b"|");
        hasher.update(timeframe.as_bytes());
        let hash = hasher.finalize();
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(seed)
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BARS)
    }
}

impl BarProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    /// Bar count and start price change the series, so both are part of the scope.
    fn cache_scope(&self) -> String {
        format!("synthetic:{}:{}", self.default_bars, self.start_price)
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError> {
        let step = parse_timeframe(&request.timeframe)?;
        let start_ms = request.since.unwrap_or(Self::DEFAULT_START_MS);
        let start: DateTime<Utc> =
            DateTime::from_timestamp_millis(start_ms).ok_or_else(|| DataError::InvalidTimestamp {
                row: 0,
                value: start_ms.to_string(),
            })?;
        let count = request.limit.unwrap_or(self.default_bars);

        let mut rng = StdRng::seed_from_u64(Self::seed(&request.symbol, &request.timeframe));
        let mut bars = Vec::with_capacity(count);
        let mut prev_close = self.start_price;
        let mut timestamp = start;

        for _ in 0..count {
            let open = prev_close;
            let close = open * (1.0 + rng.gen_range(-0.03..0.03));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(100.0..10_000.0);
            bars.push(PriceBar::new(timestamp, open, high, low, close, volume));

            prev_close = close;
            timestamp += step;
        }

        Ok(bars)
    }
}

// ─── Cache layer ────────────────────────────────────────────────────

/// Consults the cache before delegating to `inner`, and stores fresh results.
///
/// Cache failures never fail a fetch: unreadable or corrupt entries count as
/// misses and failed writes are logged.
pub struct CachedProvider<P> {
    inner: P,
    cache: Arc<dyn CacheStore>,
    max_age: Option<std::time::Duration>,
}

impl<P: BarProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            cache,
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Option<std::time::Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Cache key for `request`, scoped to the inner provider's bar stream.
    pub fn key_for(&self, request: &FetchRequest) -> String {
        let scoped = format!("{}|{}", self.inner.cache_scope(), request.cache_key());
        blake3::hash(scoped.as_bytes()).to_hex().to_string()
    }

    fn read_cached(&self, key: &str) -> Option<Vec<PriceBar>> {
        let bytes = match self.cache.get(key, self.max_age) {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!(error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(bars) => Some(bars),
            Err(e) => {
                tracing::warn!(error = %e, "corrupt cache entry ignored");
                None
            }
        }
    }
}

impl<P: BarProvider> BarProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn cache_scope(&self) -> String {
        self.inner.cache_scope()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError> {
        let key = self.key_for(request);
        if let Some(bars) = self.read_cached(&key) {
            tracing::debug!(symbol = %request.symbol, bars = bars.len(), "cache hit");
            return Ok(bars);
        }

        let bars = self.inner.fetch(request)?;
        match serde_json::to_vec(&bars) {
            Ok(bytes) => {
                if let Err(e) = self.cache.put(&key, &bytes) {
                    tracing::warn!(error = %e, "failed to save cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize bars for cache"),
        }
        Ok(bars)
    }
}
