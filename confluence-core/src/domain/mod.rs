//! Domain types: bars, price series, signal results.

pub mod bar;
pub mod series;
pub mod signal;

pub use bar::{Bar, BarError};
pub use series::{PriceSeries, SeriesError};
pub use signal::{Direction, SignalResult, HOLD_CONFIDENCE};

/// Create a synthetic series from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
/// One bar per day starting 2024-01-02.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect();
    PriceSeries::new("TEST", bars).unwrap()
}
