//! Moving Average Convergence/Divergence.
//!
//! line = EMA(fast) - EMA(slow), signal = EMA(line, signal), histogram = line - signal.
//! The line series starts once the slow EMA is seeded; the signal EMA is seeded
//! over the first `signal` line values. Fewer than `slow + signal` prices gives
//! the neutral `(0, 0, 0)`.

use serde::{Deserialize, Serialize};

use super::ema::ema_series;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Macd {
    pub const NEUTRAL: Macd = Macd {
        line: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
}

pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    if fast == 0 || signal == 0 || slow <= fast || prices.len() < slow + signal {
        return Macd::NEUTRAL;
    }

    let fast_ema = ema_series(prices, fast);
    let slow_ema = ema_series(prices, slow);
    let line_series: Vec<f64> = fast_ema[slow - 1..]
        .iter()
        .zip(&slow_ema[slow - 1..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_series = ema_series(&line_series, signal);
    let line = line_series[line_series.len() - 1];
    let signal = signal_series[signal_series.len() - 1];

    Macd {
        line,
        signal,
        histogram: line - signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, ema, DEFAULT_EPSILON};

    #[test]
    fn macd_short_series_is_neutral() {
        let prices: Vec<f64> = (0..34).map(|i| 100.0 + i as f64).collect();
        assert_eq!(macd(&prices, 12, 26, 9), Macd::NEUTRAL);
    }

    #[test]
    fn macd_line_is_fast_minus_slow() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let m = macd(&prices, 12, 26, 9);
        assert_approx(m.line, ema(&prices, 12) - ema(&prices, 26), 1e-9);
        assert_approx(m.histogram, m.line - m.signal, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_rising_series_has_positive_histogram() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 * 1.005_f64.powi(i)).collect();
        let m = macd(&prices, 12, 26, 9);
        assert!(m.line > 0.0);
        assert!(m.histogram > 0.0, "histogram = {}", m.histogram);
    }

    #[test]
    fn macd_falling_series_has_negative_line() {
        // a steady decline: the line is negative but climbing back toward zero
        let prices: Vec<f64> = (0..60).map(|i| 100.0 * 0.995_f64.powi(i)).collect();
        let m = macd(&prices, 12, 26, 9);
        assert!(m.line < 0.0);
        assert!(m.histogram > 0.0, "histogram = {}", m.histogram);
    }

    #[test]
    fn macd_fresh_selloff_has_negative_histogram() {
        let prices: Vec<f64> = (0..60)
            .map(|i| if i < 40 { 100.0 } else { 100.0 * 0.99_f64.powi(i - 39) })
            .collect();
        let m = macd(&prices, 12, 26, 9);
        assert!(m.line < 0.0);
        assert!(m.histogram < 0.0, "histogram = {}", m.histogram);
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let m = macd(&[100.0; 50], 12, 26, 9);
        assert_approx(m.line, 0.0, DEFAULT_EPSILON);
        assert_approx(m.histogram, 0.0, DEFAULT_EPSILON);
    }
}
