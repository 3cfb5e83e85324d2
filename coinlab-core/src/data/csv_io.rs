//! CSV bar files.
//!
//! Header: `timestamp,open,high,low,close,volume`. The timestamp column is
//! either RFC 3339 (`2024-01-02T00:00:00Z`) or integer epoch milliseconds.
//! Rows are returned in file order; ordering is checked by the engine.

use super::DataError;
use crate::domain::PriceBar;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<PriceBar>, DataError> {
    let file = std::fs::File::open(path).map_err(|e| DataError::io(path, e))?;
    read_bars_csv(file)
}

/// Read bars from any CSV source with a header row.
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Vec<PriceBar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (row, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            DataError::InvalidTimestamp {
                row: row + 1,
                value: record.timestamp.clone(),
            }
        })?;
        bars.push(PriceBar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    Ok(bars)
}

/// Write bars as CSV with RFC 3339 timestamps.
pub fn write_bars_csv<W: Write>(writer: W, bars: &[PriceBar]) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.timestamp.to_rfc3339(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush()
        .map_err(|e| DataError::Csv(csv::Error::from(e)))?;
    Ok(())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
