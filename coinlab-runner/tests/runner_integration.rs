//! End-to-end runner tests: TOML config on disk, CSV bars, cache reuse,
//! sweeps and artifact export.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use coinlab_core::data::{
    write_bars_csv, BarProvider, CacheStore, FetchRequest, FileCache, SyntheticProvider,
};
use coinlab_core::domain::PriceBar;
use coinlab_core::engine::EngineConfig;
use coinlab_core::signals::MaType;
use coinlab_runner::{
    format_summary, load_artifacts, run_single_backtest, save_artifacts, BacktestConfig,
    ConfigError, FitnessMetric, ParamGrid, ParamSweep, RunError, StrategyConfig,
};

fn synthetic_bars(symbol: &str, n: usize) -> Vec<PriceBar> {
    SyntheticProvider::new(n)
        .fetch(&FetchRequest::new(symbol, "1d"))
        .unwrap()
}

fn write_csv(dir: &Path, file: &str, bars: &[PriceBar]) {
    let f = File::create(dir.join(file)).unwrap();
    write_bars_csv(f, bars).unwrap();
}

fn csv_config(csv_dir: &Path, cache_dir: &Path) -> String {
    format!(
        r#"
[backtest]
initial_balance = 5000.0
commission_rate = 0.002

[strategy]
type = "MA_CROSSOVER"
fast_period = 5
slow_period = 20
ma_type = "EMA"

[data]
symbol = "ETH/USDT"
timeframe = "1d"
exchange = "testex"
csv_dir = '{}'
cache_dir = '{}'
"#,
        csv_dir.display(),
        cache_dir.display()
    )
}

#[test]
fn config_file_drives_a_csv_backtest() {
    let tmp = tempfile::tempdir().unwrap();
    let csv_dir = tmp.path().join("csv");
    let cache_dir = tmp.path().join("cache");
    std::fs::create_dir_all(&csv_dir).unwrap();
    write_csv(&csv_dir, "ETH-USDT_1d.csv", &synthetic_bars("ETH/USDT", 150));

    let config_path = tmp.path().join("backtest.toml");
    std::fs::write(&config_path, csv_config(&csv_dir, &cache_dir)).unwrap();

    let config = BacktestConfig::from_file(&config_path).unwrap();
    assert_eq!(config.backtest.initial_balance, 5000.0);
    assert_eq!(
        config.strategy,
        StrategyConfig::MaCrossover {
            fast_period: 5,
            slow_period: 20,
            ma_type: MaType::Ema,
        }
    );

    let outcome = run_single_backtest(&config, config.data.open_cache()).unwrap();
    assert_eq!(outcome.bar_count, 150);
    assert!(!outcome.has_synthetic);
    assert_eq!(outcome.result.initial_balance(), 5000.0);
    assert_eq!(outcome.warmup_bars, 1);

    // The cache now answers for the same request, even with the CSV gone.
    let cache = FileCache::new(&cache_dir, "testex");
    assert_eq!(cache.info().unwrap().entries, 1);
    std::fs::remove_dir_all(&csv_dir).unwrap();
    let again = run_single_backtest(&config, config.data.open_cache()).unwrap();
    assert_eq!(again.result, outcome.result);
    assert_eq!(again.dataset_hash, outcome.dataset_hash);
}

#[test]
fn missing_csv_without_cache_is_a_data_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = BacktestConfig::default();
    config.data.csv_dir = Some(tmp.path().to_path_buf());
    config.data.use_cache = false;

    let err = run_single_backtest(&config, config.data.open_cache()).unwrap_err();
    assert!(matches!(err, RunError::Data(_)), "{err}");
}

#[test]
fn bad_config_file_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[strategy]
type = "RSI_THRESHOLD"
oversold = 80.0
overbought = 20.0

[data]
synthetic = true
"#,
    )
    .unwrap();
    assert!(matches!(
        BacktestConfig::from_file(&path),
        Err(ConfigError::InvalidStrategy(_))
    ));

    let missing = BacktestConfig::from_file(&tmp.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));
}

#[test]
fn sweep_over_shared_bars_is_deterministic() {
    let bars = synthetic_bars("BTC/USDT", 300);
    let mut grid = ParamGrid::ma_crossover_default();
    grid.extend(ParamGrid::rsi_threshold(&[14], &[25.0, 30.0], &[70.0]));
    grid.extend(ParamGrid::macd_crossover(&[12], &[26], &[9]));
    grid.extend(ParamGrid::from_configs(vec![StrategyConfig::BuyAndHold]));
    assert_eq!(grid.size(), 13);

    let sweep = ParamSweep::new(EngineConfig::default());
    let first = sweep.sweep("BTC/USDT", &bars, &grid).unwrap();
    let second = sweep
        .clone()
        .with_parallelism(false)
        .sweep("BTC/USDT", &bars, &grid)
        .unwrap();
    assert_eq!(first.all(), second.all());

    // Grid order is preserved in the raw results.
    for (outcome, config) in first.all().iter().zip(grid.configs()) {
        assert_eq!(&outcome.strategy, config);
        assert_eq!(outcome.bar_count, 300);
    }

    let best = first.best(FitnessMetric::MaxDrawdown).unwrap();
    let min_dd = first
        .all()
        .iter()
        .map(|o| o.result.metrics().max_drawdown_pct)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.result.metrics().max_drawdown_pct, min_dd);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = BacktestConfig::default();
    config.data.synthetic = true;
    config.data.synthetic_bars = 120;
    config.strategy = StrategyConfig::MaCrossover {
        fast_period: 5,
        slow_period: 15,
        ma_type: MaType::Sma,
    };

    let cache: Arc<dyn CacheStore> = Arc::new(FileCache::new(tmp.path().join("cache"), "synthetic"));
    let outcome = run_single_backtest(&config, Some(cache)).unwrap();

    let out_dir = tmp.path().join("run");
    let written = save_artifacts(&outcome, &out_dir).unwrap();
    assert_eq!(written, out_dir);
    for file in ["result.json", "equity.csv", "trades.csv"] {
        assert!(out_dir.join(file).is_file(), "{file} missing");
    }

    let equity_rows = std::fs::read_to_string(out_dir.join("equity.csv"))
        .unwrap()
        .lines()
        .count();
    assert_eq!(equity_rows, 121);

    let loaded = load_artifacts(&out_dir).unwrap();
    assert_eq!(loaded, outcome);
    assert_eq!(format_summary(&loaded), format_summary(&outcome));
}
