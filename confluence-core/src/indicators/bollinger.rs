//! Bollinger Bands: SMA(period) ± k · stddev(period).
//!
//! Uses population stddev (divide by N).
//! Fewer than `period` prices: a band centered on the last price ± 2%.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Position of `price` inside the band: 0 at the lower band, 1 at the upper.
    /// A zero-width band reports 0.5.
    pub fn percent_b(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width <= 0.0 {
            0.5
        } else {
            (price - self.lower) / width
        }
    }
}

const DEGENERATE_HALF_WIDTH: f64 = 0.02;

pub fn bollinger_bands(prices: &[f64], period: usize, k: f64) -> BollingerBands {
    let last = prices.last().copied().unwrap_or(0.0);
    if period == 0 || prices.len() < period {
        return BollingerBands {
            upper: last * (1.0 + DEGENERATE_HALF_WIDTH),
            middle: last,
            lower: last * (1.0 - DEGENERATE_HALF_WIDTH),
        };
    }

    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|p| {
            let diff = p - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let stddev = variance.sqrt();

    BollingerBands {
        upper: mean + k * stddev,
        middle: mean,
        lower: mean - k * stddev,
    }
}
