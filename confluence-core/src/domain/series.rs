//! PriceSeries: an immutable, ordered run of bars for one instrument.
//!
//! The series is a value object: construction validates every bar and the
//! timestamp order, after which nothing can mutate it. Appending returns a new
//! series; taking a prefix shares the underlying buffer. Concurrent readers need
//! no synchronization.

use std::sync::Arc;

use thiserror::Error;

use super::bar::{Bar, BarError};

/// A series that violates the caller contract (malformed input).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index}: timestamp {current} is not after previous timestamp {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: chrono::NaiveDateTime,
        current: chrono::NaiveDateTime,
    },

    #[error(transparent)]
    InvalidBar(#[from] BarError),

    #[error("baseline volume must be positive and finite, got {0}")]
    InvalidBaselineVolume(f64),
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    instrument: String,
    bars: Arc<Vec<Bar>>,
    len: usize,
    baseline_volume: Option<f64>,
}

impl PriceSeries {
    /// Build a series, rejecting non-monotonic timestamps and insane bars.
    ///
    /// An empty series is valid: a feed starts empty. Scoring an empty series
    /// is what fails.
    pub fn new(instrument: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        validate_bars(&bars, 0, None)?;
        let len = bars.len();
        Ok(Self {
            instrument: instrument.into(),
            bars: Arc::new(bars),
            len,
            baseline_volume: None,
        })
    }

    /// Attach an instrument-specific baseline volume used by `volume_ratio`.
    pub fn with_baseline_volume(mut self, baseline: f64) -> Result<Self, SeriesError> {
        if !(baseline.is_finite() && baseline > 0.0) {
            return Err(SeriesError::InvalidBaselineVolume(baseline));
        }
        self.baseline_volume = Some(baseline);
        Ok(self)
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn baseline_volume(&self) -> Option<f64> {
        self.baseline_volume
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars().last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars().iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars().iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars().iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars().iter().map(|b| b.volume).collect()
    }

    /// The first `len` bars as their own series, sharing this buffer.
    ///
    /// `len` larger than the series is clamped.
    pub fn prefix(&self, len: usize) -> PriceSeries {
        Self {
            instrument: self.instrument.clone(),
            bars: Arc::clone(&self.bars),
            len: len.min(self.len),
            baseline_volume: self.baseline_volume,
        }
    }

    /// A new series with `bar` appended. The receiver is left untouched.
    pub fn appended(&self, bar: Bar) -> Result<PriceSeries, SeriesError> {
        validate_bars(std::slice::from_ref(&bar), self.len, self.last())?;
        let mut bars = Vec::with_capacity(self.len + 1);
        bars.extend_from_slice(self.bars());
        bars.push(bar);
        let len = bars.len();
        Ok(Self {
            instrument: self.instrument.clone(),
            bars: Arc::new(bars),
            len,
            baseline_volume: self.baseline_volume,
        })
    }
}

fn validate_bars(bars: &[Bar], offset: usize, previous: Option<&Bar>) -> Result<(), SeriesError> {
    let mut prev = previous.map(|b| b.timestamp);
    for (i, bar) in bars.iter().enumerate() {
        let index = offset + i;
        bar.validate(index)?;
        if let Some(previous) = prev {
            if bar.timestamp <= previous {
                return Err(SeriesError::NonMonotonicTimestamp {
                    index,
                    previous,
                    current: bar.timestamp,
                });
            }
        }
        prev = Some(bar.timestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::make_series;

    #[test]
    fn accepts_ordered_bars() {
        let series = make_series(&[100.0, 101.0, 102.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.instrument(), "TEST");
        assert_eq!(series.closes(), vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("EMPTY", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let series = make_series(&[100.0, 101.0]);
        let mut bars = series.bars().to_vec();
        bars[1].timestamp = bars[0].timestamp;
        let err = PriceSeries::new("TEST", bars).unwrap_err();
        assert!(matches!(
            err,
            SeriesError::NonMonotonicTimestamp { index: 1, .. }
        ));
    }

    #[test]
    fn rejects_insane_bar() {
        let series = make_series(&[100.0, 101.0]);
        let mut bars = series.bars().to_vec();
        bars[1].low = bars[1].high + 1.0;
        let err = PriceSeries::new("TEST", bars).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidBar(_)));
    }

    #[test]
    fn prefix_shares_buffer_and_clamps() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0]);
        let head = series.prefix(2);
        assert_eq!(head.closes(), vec![1.0, 2.0]);
        assert_eq!(series.prefix(99).len(), 4);
        // original untouched
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn appended_returns_new_series() {
        let series = make_series(&[1.0, 2.0]);
        let mut next = *series.last().unwrap();
        next.timestamp += chrono::Duration::days(1);
        let longer = series.appended(next).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(longer.len(), 3);
    }

    #[test]
    fn appended_rejects_stale_timestamp() {
        let series = make_series(&[1.0, 2.0]);
        let stale = series.bars()[0];
        assert!(series.appended(stale).is_err());
    }

    #[test]
    fn baseline_volume_must_be_positive() {
        let series = make_series(&[1.0, 2.0]);
        assert!(series.clone().with_baseline_volume(0.0).is_err());
        let series = series.with_baseline_volume(5_000.0).unwrap();
        assert_eq!(series.baseline_volume(), Some(5_000.0));
        assert_eq!(series.prefix(1).baseline_volume(), Some(5_000.0));
    }
}
