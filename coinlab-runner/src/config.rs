//! Serializable backtest configuration.
//!
//! A run is described by one TOML file with three sections:
//!
//! ```toml
//! [backtest]
//! initial_balance = 10000.0
//! commission_rate = 0.001
//!
//! [strategy]
//! type = "MA_CROSSOVER"
//! fast_period = 20
//! slow_period = 50
//!
//! [data]
//! symbol = "BTC/USDT"
//! timeframe = "1d"
//! synthetic = true
//! ```
//!
//! Every field has a default. `validate()` still requires a bar source in
//! `[data]` (either `csv_dir` or `synthetic = true`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coinlab_core::data::{CacheStore, FetchRequest, FileCache, SyntheticProvider};
use coinlab_core::engine::config::{
    DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_BALANCE, DEFAULT_PERIODS_PER_YEAR,
    DEFAULT_POSITION_SIZE_FRACTION,
};
use coinlab_core::engine::EngineConfig;
use coinlab_core::signals::{
    BuyAndHold, MaCrossover, MaType, MacdCrossover, RsiThreshold, SignalSource,
};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid [backtest] section: {0}")]
    InvalidBacktest(String),

    #[error("invalid [strategy] section: {0}")]
    InvalidStrategy(String),

    #[error("invalid [data] section: {0}")]
    InvalidData(String),
}

// ─── [backtest] ─────────────────────────────────────────────────────

/// Engine parameters. Defaults match `EngineConfig::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_balance: f64,
    pub commission_rate: f64,
    pub position_size_fraction: f64,
    pub periods_per_year: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            commission_rate: DEFAULT_COMMISSION_RATE,
            position_size_fraction: DEFAULT_POSITION_SIZE_FRACTION,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

// ─── [strategy] ─────────────────────────────────────────────────────

fn default_ma_fast() -> usize {
    20
}
fn default_ma_slow() -> usize {
    50
}
fn default_rsi_period() -> usize {
    14
}
fn default_rsi_oversold() -> f64 {
    30.0
}
fn default_rsi_overbought() -> f64 {
    70.0
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}

/// Signal source selection (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Fast MA crosses slow MA.
    MaCrossover {
        #[serde(default = "default_ma_fast")]
        fast_period: usize,
        #[serde(default = "default_ma_slow")]
        slow_period: usize,
        #[serde(default)]
        ma_type: MaType,
    },

    /// RSI leaves the oversold / overbought zone.
    RsiThreshold {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_rsi_oversold")]
        oversold: f64,
        #[serde(default = "default_rsi_overbought")]
        overbought: f64,
    },

    /// MACD line crosses its signal line.
    MacdCrossover {
        #[serde(default = "default_macd_fast")]
        fast: usize,
        #[serde(default = "default_macd_slow")]
        slow: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
    },

    /// Buy on the first bar and hold.
    BuyAndHold,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::MaCrossover {
            fast_period: default_ma_fast(),
            slow_period: default_ma_slow(),
            ma_type: MaType::Sma,
        }
    }
}

impl StrategyConfig {
    /// Short strategy name, matching `SignalSource::name()`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaCrossover { .. } => "ma_crossover",
            Self::RsiThreshold { .. } => "rsi_threshold",
            Self::MacdCrossover { .. } => "macd_crossover",
            Self::BuyAndHold => "buy_and_hold",
        }
    }

    /// Name plus parameters, e.g. `ma_crossover(20,50,SMA)`.
    pub fn label(&self) -> String {
        match self {
            Self::MaCrossover {
                fast_period,
                slow_period,
                ma_type,
            } => {
                let kind = match ma_type {
                    MaType::Sma => "SMA",
                    MaType::Ema => "EMA",
                };
                format!("ma_crossover({fast_period},{slow_period},{kind})")
            }
            Self::RsiThreshold {
                period,
                oversold,
                overbought,
            } => format!("rsi_threshold({period},{oversold},{overbought})"),
            Self::MacdCrossover { fast, slow, signal } => {
                format!("macd_crossover({fast},{slow},{signal})")
            }
            Self::BuyAndHold => "buy_and_hold".to_string(),
        }
    }

    /// Check parameters without constructing the source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidStrategy(msg));
        match *self {
            Self::MaCrossover {
                fast_period,
                slow_period,
                ..
            } => {
                if fast_period == 0 {
                    return invalid("fast_period must be >= 1".into());
                }
                if slow_period <= fast_period {
                    return invalid(format!(
                        "slow_period ({slow_period}) must be > fast_period ({fast_period})"
                    ));
                }
            }
            Self::RsiThreshold {
                period,
                oversold,
                overbought,
            } => {
                if period == 0 {
                    return invalid("period must be >= 1".into());
                }
                if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
                    return invalid("thresholds must be within 0..=100".into());
                }
                if oversold >= overbought {
                    return invalid(format!(
                        "oversold ({oversold}) must be < overbought ({overbought})"
                    ));
                }
            }
            Self::MacdCrossover { fast, slow, signal } => {
                if fast == 0 || slow == 0 || signal == 0 {
                    return invalid("MACD periods must be >= 1".into());
                }
                if fast >= slow {
                    return invalid(format!("fast ({fast}) must be < slow ({slow})"));
                }
            }
            Self::BuyAndHold => {}
        }
        Ok(())
    }

    /// Build the signal source. Parameters are validated first.
    pub fn build(&self) -> Result<Box<dyn SignalSource>, ConfigError> {
        self.validate()?;
        let source: Box<dyn SignalSource> = match *self {
            Self::MaCrossover {
                fast_period,
                slow_period,
                ma_type,
            } => Box::new(MaCrossover::new(fast_period, slow_period, ma_type)),
            Self::RsiThreshold {
                period,
                oversold,
                overbought,
            } => Box::new(RsiThreshold::new(period, oversold, overbought)),
            Self::MacdCrossover { fast, slow, signal } => {
                Box::new(MacdCrossover::new(fast, slow, signal))
            }
            Self::BuyAndHold => Box::new(BuyAndHold),
        };
        Ok(source)
    }
}

// ─── [data] ─────────────────────────────────────────────────────────

/// Where bars come from and how they are cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub symbol: String,
    pub timeframe: String,
    /// Cache namespace (exchange or source name).
    pub exchange: String,
    /// Directory of `{SYMBOL}_{timeframe}.csv` files.
    pub csv_dir: Option<PathBuf>,
    /// Generate a deterministic random walk instead of reading files.
    pub synthetic: bool,
    pub synthetic_bars: usize,
    /// Earliest bar, epoch milliseconds.
    pub since: Option<i64>,
    pub limit: Option<usize>,
    pub use_cache: bool,
    pub cache_dir: PathBuf,
    /// `None` never expires.
    pub cache_max_age_hours: Option<u64>,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            symbol: "BTC/USDT".into(),
            timeframe: "1d".into(),
            exchange: "binance".into(),
            csv_dir: None,
            synthetic: false,
            synthetic_bars: SyntheticProvider::DEFAULT_BARS,
            since: None,
            limit: None,
            use_cache: true,
            cache_dir: PathBuf::from("data/raw"),
            cache_max_age_hours: None,
        }
    }
}

impl DataSection {
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            since: self.since,
            limit: self.limit,
        }
    }

    pub fn cache_max_age(&self) -> Option<std::time::Duration> {
        self.cache_max_age_hours
            .map(|h| std::time::Duration::from_secs(h.saturating_mul(3600)))
    }

    /// The file cache this section points at, if caching is enabled.
    pub fn open_cache(&self) -> Option<Arc<dyn CacheStore>> {
        self.use_cache
            .then(|| {
                Arc::new(FileCache::new(&self.cache_dir, &self.exchange)) as Arc<dyn CacheStore>
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidData("symbol must not be empty".into()));
        }
        coinlab_core::data::parse_timeframe(&self.timeframe)
            .map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        match (&self.csv_dir, self.synthetic) {
            (None, false) => Err(ConfigError::InvalidData(
                "no bar source: set csv_dir or synthetic = true".into(),
            )),
            (Some(_), true) => Err(ConfigError::InvalidData(
                "csv_dir and synthetic are mutually exclusive".into(),
            )),
            _ => Ok(()),
        }
    }
}

// ─── Whole file ─────────────────────────────────────────────────────

/// Full configuration for a single backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub data: DataSection,
}

impl BacktestConfig {
    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_engine_config()
            .validate()
            .map_err(|e| ConfigError::InvalidBacktest(e.to_string()))?;
        self.strategy.validate()?;
        self.data.validate()
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            self.backtest.initial_balance,
            self.backtest.commission_rate,
            self.backtest.position_size_fraction,
        )
        .with_periods_per_year(self.backtest.periods_per_year)
    }

    /// Deterministic hash of the whole configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Plain structs with string keys always serialize.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
