//! Artifact export: JSON result, equity curve CSV and trade tape CSV.
//!
//! The JSON artifact carries a `schema_version`. Newer versions are
//! rejected on load, as is a result whose metrics no longer match its
//! equity curve and trade log.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use coinlab_core::domain::equity::equity_values;
use coinlab_core::domain::{EquityPoint, Trade};
use coinlab_core::metrics::drawdown_series;

use crate::runner::{RunOutcome, SCHEMA_VERSION};

pub const RESULT_FILE: &str = "result.json";
pub const EQUITY_FILE: &str = "equity.csv";
pub const TRADES_FILE: &str = "trades.csv";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunOutcome` to pretty JSON.
pub fn export_json(outcome: &RunOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("failed to serialize RunOutcome to JSON")
}

/// Deserialize a `RunOutcome` from JSON, rejecting unknown schema versions
/// and results that fail `BacktestResult::verify`.
pub fn import_json(json: &str) -> Result<RunOutcome> {
    let outcome: RunOutcome =
        serde_json::from_str(json).context("failed to deserialize RunOutcome from JSON")?;
    if outcome.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            outcome.schema_version,
            SCHEMA_VERSION
        );
    }
    if let Err(reason) = outcome.result.verify() {
        bail!("result does not match its ledger: {reason}");
    }
    Ok(outcome)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade log as CSV. Open trades leave the exit columns empty.
///
/// Columns: entry_index, entry_timestamp, entry_price, entry_spend,
/// exit_index, exit_timestamp, exit_price, units, commission, realized_pnl,
/// return_pct, bars_held
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_index",
        "entry_timestamp",
        "entry_price",
        "entry_spend",
        "exit_index",
        "exit_timestamp",
        "exit_price",
        "units",
        "commission",
        "realized_pnl",
        "return_pct",
        "bars_held",
    ])?;

    fn opt<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    fn opt_f(value: Option<f64>, decimals: usize) -> String {
        value.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
    }

    for t in trades {
        wtr.write_record([
            t.entry_index.to_string(),
            t.entry_timestamp.to_rfc3339(),
            format!("{:.6}", t.entry_price),
            format!("{:.2}", t.entry_spend),
            opt(t.exit_index),
            opt(t.exit_timestamp.map(|ts| ts.to_rfc3339())),
            opt_f(t.exit_price, 6),
            format!("{:.8}", t.units),
            format!("{:.2}", t.commission),
            opt_f(t.realized_pnl, 2),
            opt_f(t.return_pct(), 4),
            opt(t.bars_held()),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve as CSV, with the per-bar drawdown alongside.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let drawdown = drawdown_series(&equity_values(curve));

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "timestamp",
        "close",
        "cash",
        "units_held",
        "position_value",
        "total_equity",
        "drawdown_pct",
    ])?;
    for (i, p) in curve.iter().enumerate() {
        wtr.write_record([
            p.index.to_string(),
            p.timestamp.to_rfc3339(),
            format!("{:.6}", p.close),
            format!("{:.2}", p.cash),
            format!("{:.8}", p.units_held),
            format!("{:.2}", p.position_value),
            format!("{:.2}", p.total_equity),
            format!("{:.4}", drawdown.get(i).copied().unwrap_or(0.0)),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `result.json`, `equity.csv` and `trades.csv` into `output_dir`.
///
/// The directory is created if missing. Returns `output_dir`.
pub fn save_artifacts(outcome: &RunOutcome, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    let write = |name: &str, contents: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    };

    write(RESULT_FILE, export_json(outcome)?)?;
    write(EQUITY_FILE, export_equity_csv(outcome.result.equity_curve())?)?;
    write(TRADES_FILE, export_trades_csv(outcome.result.trades())?)?;

    tracing::info!(dir = %output_dir.display(), "artifacts saved");
    Ok(output_dir.to_path_buf())
}

/// Load a `RunOutcome` from an artifact directory's `result.json`.
pub fn load_artifacts(dir: &Path) -> Result<RunOutcome> {
    let path = dir.join(RESULT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::runner::run_backtest_on_bars;
    use chrono::{Duration, TimeZone, Utc};
    use coinlab_core::domain::PriceBar;
    use coinlab_core::engine::EngineConfig;

    fn outcome(closes: &[f64]) -> RunOutcome {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(start + Duration::days(i as i64), c, c, c, c, 1.0))
            .collect();
        run_backtest_on_bars(
            "ETH/USDT",
            &bars,
            &StrategyConfig::BuyAndHold,
            &EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn json_round_trip() {
        let original = outcome(&[100.0, 105.0, 95.0]);
        let json = export_json(&original).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        assert_eq!(import_json(&json).unwrap(), original);
    }

    #[test]
    fn newer_schema_rejected() {
        let mut future = outcome(&[100.0, 101.0]);
        future.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&future).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn edited_metrics_rejected() {
        let original = outcome(&[100.0, 105.0, 95.0]);
        let mut value: serde_json::Value =
            serde_json::from_str(&export_json(&original).unwrap()).unwrap();
        value["result"]["metrics"]["total_return_pct"] = serde_json::json!(250.0);
        let err = import_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("total_return_pct"), "{err}");
    }

    #[test]
    fn missing_periods_per_year_defaults() {
        let original = outcome(&[100.0, 105.0, 95.0]);
        let mut value: serde_json::Value =
            serde_json::from_str(&export_json(&original).unwrap()).unwrap();
        value["result"]
            .as_object_mut()
            .unwrap()
            .remove("periods_per_year");
        assert_eq!(import_json(&value.to_string()).unwrap(), original);
    }

    #[test]
    fn equity_csv_has_drawdown_column() {
        let o = outcome(&[100.0, 120.0, 90.0]);
        let csv = export_equity_csv(o.result.equity_curve()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("total_equity,drawdown_pct"));
        assert!(lines[1].ends_with(",0.0000"));
        assert!(lines[2].ends_with(",0.0000"));
        // 120 -> 90 on a fully invested position is a 25% drawdown
        assert!(lines[3].ends_with(",25.0000"), "{}", lines[3]);
    }

    #[test]
    fn open_trade_leaves_exit_columns_empty() {
        let o = outcome(&[100.0, 110.0]);
        let csv = export_trades_csv(o.result.trades()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        let cols: Vec<&str> = row.split(',').collect();
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[0], "0");
        assert!(cols[4].is_empty() && cols[5].is_empty() && cols[9].is_empty());
    }
}
