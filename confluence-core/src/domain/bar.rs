//! Bar: one OHLCV sample of a price series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single instrument at a single timestamp.
///
/// Bars are immutable once recorded. Instrument identity lives on the owning
/// `PriceSeries`, not on every bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Check the bar's internal consistency.
    ///
    /// `index` is the bar's position in its series and is only used to make the
    /// error point at the offending row.
    pub fn validate(&self, index: usize) -> Result<(), BarError> {
        if self.has_non_finite() {
            return Err(BarError::NonFiniteField { index });
        }
        if self.high < self.low
            || self.open > self.high
            || self.open < self.low
            || self.close > self.high
            || self.close < self.low
        {
            return Err(BarError::InvertedRange {
                index,
                high: self.high,
                low: self.low,
            });
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume {
                index,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

/// A single bar that fails the OHLCV sanity rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index}: OHLCV field is NaN or infinite")]
    NonFiniteField { index: usize },

    #[error("bar {index}: open/close outside [low, high] (high={high}, low={low})")]
    InvertedRange { index: usize, high: f64, low: f64 },

    #[error("bar {index}: negative volume {volume}")]
    NegativeVolume { index: usize, volume: f64 },
}
