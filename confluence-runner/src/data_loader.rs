//! CSV bar loading for historical replay and one-off scoring.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps may be
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 (converted to naive UTC).
//! Rows must already be in ascending time order; the series constructor
//! rejects anything else.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use confluence_core::domain::{Bar, PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("no bars in input")]
    Empty,

    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load a CSV file into a validated series named `instrument`.
pub fn load_csv(path: &Path, instrument: &str) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = read_csv(file, instrument)?;
    tracing::debug!(
        path = %path.display(),
        instrument,
        bars = series.len(),
        "loaded csv"
    );
    Ok(series)
}

/// Parse CSV from any reader.
pub fn read_csv<R: Read>(reader: R, instrument: &str) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // header is line 1
        let line = i + 2;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: line,
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(PriceSeries::new(instrument, bars)?)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}
