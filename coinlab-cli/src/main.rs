//! CoinLab CLI: backtest, sweep, indicator and cache commands.
//!
//! Commands:
//! - `backtest`: run one strategy from a TOML config file or flags
//! - `sweep`: grid-search MA crossover parameters and rank the results
//! - `indicators`: print the standard indicator set for the latest bars
//! - `cache info` / `cache clear`: inspect or prune the bar cache

mod obs;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use coinlab_core::data::{CacheStore, FileCache};
use coinlab_core::indicators::standard_indicators;
use coinlab_core::signals::MaType;
use coinlab_runner::report::format_trade_log;
use coinlab_runner::{
    format_summary, format_sweep_table, load_bars, run_single_backtest, save_artifacts,
    BacktestConfig, DataSection, FitnessMetric, ParamGrid, ParamSweep, StrategyConfig,
};

use crate::obs::LogFormat;

#[derive(Parser)]
#[command(name = "coinlab", about = "CoinLab CLI: crypto strategy backtesting")]
struct Cli {
    /// Log level when COINLAB_LOG is unset (e.g. info, debug, coinlab_core=trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest and print the results.
    Backtest {
        /// Path to a TOML config file. Strategy and data flags are ignored when set.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        strategy: StrategyArgs,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print every trade after the summary.
        #[arg(long, default_value_t = false)]
        show_trades: bool,

        /// Write result.json, equity.csv and trades.csv to this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Grid-search MA crossover periods over the same bars.
    Sweep {
        /// Fast periods to try.
        #[arg(long, value_delimiter = ',', default_values_t = [10, 20, 30])]
        fast: Vec<usize>,

        /// Slow periods to try. Pairs with fast >= slow are skipped.
        #[arg(long, value_delimiter = ',', default_values_t = [50, 100, 200])]
        slow: Vec<usize>,

        #[arg(long, value_enum, default_value_t = MaKind::Sma)]
        ma_type: MaKind,

        /// Ranking metric: total_return, sharpe, max_drawdown, win_rate.
        #[arg(long, default_value = "sharpe")]
        metric: FitnessMetric,

        /// Number of rows to show.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Run the grid on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the standard indicator set for the most recent bars.
    Indicators {
        /// Number of trailing bars to show.
        #[arg(long, default_value_t = 5)]
        last: usize,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report entry count, size and location.
    Info {
        #[command(flatten)]
        target: CacheTarget,
    },
    /// Remove cached entries, optionally only those older than N days.
    Clear {
        #[arg(long)]
        older_than_days: Option<u64>,

        #[command(flatten)]
        target: CacheTarget,
    },
}

#[derive(Args)]
struct CacheTarget {
    /// Cache directory.
    #[arg(long, default_value = "data/raw")]
    cache_dir: PathBuf,

    /// Cache namespace (exchange or source name).
    #[arg(long, default_value = "binance")]
    exchange: String,
}

#[derive(Args)]
struct DataArgs {
    #[arg(long, default_value = "BTC/USDT")]
    symbol: String,

    #[arg(long, default_value = "1d")]
    timeframe: String,

    /// Cache namespace (exchange or source name).
    #[arg(long, default_value = "binance")]
    exchange: String,

    /// Directory of `{SYMBOL}_{timeframe}.csv` files.
    #[arg(long, conflicts_with = "synthetic")]
    csv_dir: Option<PathBuf>,

    /// Use a deterministic random walk instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Bar count for synthetic data.
    #[arg(long, default_value_t = 365)]
    bars: usize,

    /// Cache directory.
    #[arg(long, default_value = "data/raw")]
    cache_dir: PathBuf,

    /// Bypass the cache entirely.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Treat cache entries older than this many hours as stale.
    #[arg(long)]
    cache_max_age_hours: Option<u64>,
}

impl DataArgs {
    fn to_section(&self) -> DataSection {
        DataSection {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            exchange: self.exchange.clone(),
            csv_dir: self.csv_dir.clone(),
            synthetic: self.synthetic,
            synthetic_bars: self.bars,
            use_cache: !self.no_cache,
            cache_dir: self.cache_dir.clone(),
            cache_max_age_hours: self.cache_max_age_hours,
            ..DataSection::default()
        }
    }
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, default_value_t = 10_000.0)]
    initial_balance: f64,

    /// Fraction of each trade's notional paid as commission.
    #[arg(long, default_value_t = 0.001)]
    commission: f64,

    /// Fraction of cash committed on each BUY.
    #[arg(long, default_value_t = 1.0)]
    position_size: f64,

    /// Bars per year for Sharpe annualization (252 daily, 365 for 24/7 markets).
    #[arg(long, default_value_t = 252.0)]
    periods_per_year: f64,
}

#[derive(Args)]
struct StrategyArgs {
    #[arg(long, value_enum, default_value_t = StrategyKind::MaCrossover)]
    strategy: StrategyKind,

    /// MA crossover fast period / MACD fast period.
    #[arg(long)]
    fast: Option<usize>,

    /// MA crossover slow period / MACD slow period.
    #[arg(long)]
    slow: Option<usize>,

    #[arg(long, value_enum, default_value_t = MaKind::Sma)]
    ma_type: MaKind,

    /// MACD signal period.
    #[arg(long)]
    signal: Option<usize>,

    /// RSI period.
    #[arg(long)]
    rsi_period: Option<usize>,

    #[arg(long)]
    oversold: Option<f64>,

    #[arg(long)]
    overbought: Option<f64>,
}

impl StrategyArgs {
    fn to_config(&self) -> StrategyConfig {
        match self.strategy {
            StrategyKind::MaCrossover => StrategyConfig::MaCrossover {
                fast_period: self.fast.unwrap_or(20),
                slow_period: self.slow.unwrap_or(50),
                ma_type: self.ma_type.into(),
            },
            StrategyKind::RsiThreshold => StrategyConfig::RsiThreshold {
                period: self.rsi_period.unwrap_or(14),
                oversold: self.oversold.unwrap_or(30.0),
                overbought: self.overbought.unwrap_or(70.0),
            },
            StrategyKind::MacdCrossover => StrategyConfig::MacdCrossover {
                fast: self.fast.unwrap_or(12),
                slow: self.slow.unwrap_or(26),
                signal: self.signal.unwrap_or(9),
            },
            StrategyKind::BuyAndHold => StrategyConfig::BuyAndHold,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyKind {
    MaCrossover,
    RsiThreshold,
    MacdCrossover,
    BuyAndHold,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaKind {
    Sma,
    Ema,
}

impl From<MaKind> for MaType {
    fn from(kind: MaKind) -> Self {
        match kind {
            MaKind::Sma => MaType::Sma,
            MaKind::Ema => MaType::Ema,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Backtest {
            config,
            strategy,
            data,
            engine,
            show_trades,
            output_dir,
        } => run_backtest_cmd(
            config.as_deref(),
            &strategy,
            &data,
            &engine,
            show_trades,
            output_dir.as_deref(),
        ),
        Commands::Sweep {
            fast,
            slow,
            ma_type,
            metric,
            top,
            sequential,
            data,
            engine,
        } => run_sweep_cmd(&fast, &slow, ma_type, metric, top, sequential, &data, &engine),
        Commands::Indicators { last, data } => run_indicators_cmd(last, &data),
        Commands::Cache { action } => match action {
            CacheAction::Info { target } => run_cache_info(&target),
            CacheAction::Clear {
                older_than_days,
                target,
            } => run_cache_clear(&target, older_than_days),
        },
    }
}

/// Build a validated config from the command-line flags.
fn config_from_args(
    strategy: StrategyConfig,
    data: &DataArgs,
    engine: &EngineArgs,
) -> Result<BacktestConfig> {
    let mut config = BacktestConfig {
        strategy,
        data: data.to_section(),
        ..BacktestConfig::default()
    };
    config.backtest.initial_balance = engine.initial_balance;
    config.backtest.commission_rate = engine.commission;
    config.backtest.position_size_fraction = engine.position_size;
    config.backtest.periods_per_year = engine.periods_per_year;

    if config.data.csv_dir.is_none() && !config.data.synthetic {
        bail!("no data source: pass --csv-dir <DIR> or --synthetic");
    }
    config.validate().context("invalid command-line configuration")?;
    Ok(config)
}

fn run_backtest_cmd(
    config_path: Option<&Path>,
    strategy: &StrategyArgs,
    data: &DataArgs,
    engine: &EngineArgs,
    show_trades: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => config_from_args(strategy.to_config(), data, engine)?,
    };

    let outcome = run_single_backtest(&config, config.data.open_cache())
        .with_context(|| format!("backtest of {} failed", config.strategy.label()))?;

    print!("{}", format_summary(&outcome));
    if show_trades {
        println!();
        print!("{}", format_trade_log(&outcome));
    }
    if outcome.has_synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
    }

    if let Some(dir) = output_dir {
        let dir = save_artifacts(&outcome, dir)?;
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_sweep_cmd(
    fast: &[usize],
    slow: &[usize],
    ma_type: MaKind,
    metric: FitnessMetric,
    top: usize,
    sequential: bool,
    data: &DataArgs,
    engine: &EngineArgs,
) -> Result<()> {
    let grid = ParamGrid::ma_crossover(fast, slow, ma_type.into());
    if grid.size() == 0 {
        bail!("empty grid: every fast period is >= every slow period");
    }

    let config = config_from_args(StrategyConfig::default(), data, engine)?;
    let loaded = load_bars(&config.data, config.data.open_cache())
        .with_context(|| format!("failed to load bars for {}", config.data.symbol))?;

    let results = ParamSweep::new(config.to_engine_config())
        .with_parallelism(!sequential)
        .sweep(&config.data.symbol, &loaded.bars, &grid)
        .context("sweep failed")?;

    println!(
        "{} {}: {} bars, {} configs",
        config.data.symbol,
        config.data.timeframe,
        loaded.bars.len(),
        grid.size()
    );
    print!("{}", format_sweep_table(&results, metric, top));
    Ok(())
}

fn run_indicators_cmd(last: usize, data: &DataArgs) -> Result<()> {
    let section = data.to_section();
    if section.csv_dir.is_none() && !section.synthetic {
        bail!("no data source: pass --csv-dir <DIR> or --synthetic");
    }
    let loaded = load_bars(&section, section.open_cache())
        .with_context(|| format!("failed to load bars for {}", section.symbol))?;
    let bars = &loaded.bars;
    let values = standard_indicators(bars);

    let start = bars.len().saturating_sub(last);
    let names: Vec<&str> = values.names().collect();

    print!("{:<12}", "date");
    for name in &names {
        print!(" {name:>14}");
    }
    println!();
    for (i, bar) in bars.iter().enumerate().skip(start) {
        print!("{:<12}", bar.timestamp.format("%Y-%m-%d").to_string());
        for name in &names {
            match values.get(name, i) {
                Some(v) if v.is_finite() => print!(" {v:>14.4}"),
                _ => print!(" {:>14}", "-"),
            }
        }
        println!();
    }
    Ok(())
}

fn run_cache_info(target: &CacheTarget) -> Result<()> {
    let cache = FileCache::new(&target.cache_dir, &target.exchange);
    let info = cache.info().context("failed to read cache")?;
    println!("Cache: {}", info.location);
    println!("Namespace: {}", target.exchange);
    println!("Entries: {}", info.entries);
    println!("Total size: {:.2} MB", info.total_size_mb());
    Ok(())
}

/// Whole days as a `Duration`, saturating instead of overflowing.
fn days_to_duration(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(24 * 3600))
}

fn run_cache_clear(target: &CacheTarget, older_than_days: Option<u64>) -> Result<()> {
    let cache = FileCache::new(&target.cache_dir, &target.exchange);
    let older_than = older_than_days.map(days_to_duration);
    let removed = cache.clear(older_than).context("failed to clear cache")?;
    match older_than_days {
        Some(days) => println!("Removed {removed} entries older than {days} days."),
        None => println!("Removed {removed} entries."),
    }
    Ok(())
}
