//! Stochastic oscillator (%K, %D).
//!
//! %K = 100 · (close - lowest_low) / (highest_high - lowest_low) over `k_period` bars.
//! %D = simple mean of the last `d_period` %K values.
//! A flat window (highest_high == lowest_low) reads 50. Fewer than
//! `k_period + d_period - 1` bars gives the neutral (50, 50).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

impl Stochastic {
    pub const NEUTRAL: Stochastic = Stochastic { k: 50.0, d: 50.0 };
}

pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    d_period: usize,
) -> Stochastic {
    // Align the three inputs on their latest sample.
    let n = high.len().min(low.len()).min(close.len());
    if k_period == 0 || d_period == 0 || n < k_period + d_period - 1 {
        return Stochastic::NEUTRAL;
    }
    let high = &high[high.len() - n..];
    let low = &low[low.len() - n..];
    let close = &close[close.len() - n..];

    let percent_k = |end: usize| -> f64 {
        let start = end + 1 - k_period;
        let hh = high[start..=end].iter().copied().fold(f64::MIN, f64::max);
        let ll = low[start..=end].iter().copied().fold(f64::MAX, f64::min);
        let range = hh - ll;
        if range <= 0.0 {
            50.0
        } else {
            (100.0 * (close[end] - ll) / range).clamp(0.0, 100.0)
        }
    };

    let k = percent_k(n - 1);
    let d = ((n - d_period)..n).map(percent_k).sum::<f64>() / d_period as f64;

    Stochastic {
        k,
        d: d.clamp(0.0, 100.0),
    }
}
