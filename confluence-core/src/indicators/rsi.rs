//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple mean of the first `period` changes, then
//! avg = (avg * (period - 1) + x) / period for every later change.
//! Edge cases: no gains and no losses → 50; avg_loss == 0 → 100;
//! avg_gain == 0 → 0; fewer than `period + 1` prices → 50.

/// Neutral reading returned whenever the RSI cannot be computed.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Wilder RSI at the latest price. Always within [0, 100].
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in prices[..=period].windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let alpha = 1.0 / period as f64;
    for w in prices[period..].windows(2) {
        let change = w[1] - w[0];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
    }

    compute_rsi(avg_gain, avg_loss)
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        NEUTRAL_RSI // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        assert_approx(rsi(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        assert_approx(rsi(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3), 0.0, 1e-9);
    }

    #[test]
    fn rsi_seed_value() {
        // Changes: +0.34, -0.25, -0.48
        // avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI = 100 - 100/(1 + 0.34/0.73) = 31.7757...
        let value = rsi(&[44.0, 44.34, 44.09, 43.61], 3);
        assert_approx(value, 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // seed as above, then +0.72:
        // avg_gain = (0.34/3 * 2 + 0.72) / 3, avg_loss = (0.73/3 * 2) / 3
        let value = rsi(&[44.0, 44.34, 44.09, 43.61, 44.33], 3);
        let gain = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let loss = (0.73 / 3.0 * 2.0) / 3.0;
        assert_approx(value, 100.0 - 100.0 / (1.0 + gain / loss), 1e-9);
    }

    #[test]
    fn rsi_flat_series_is_neutral() {
        assert_eq!(rsi(&[100.0; 50], 14), 50.0);
    }

    #[test]
    fn rsi_short_series_is_neutral() {
        assert_eq!(rsi(&[100.0, 101.0, 102.0], 14), 50.0);
        assert_eq!(rsi(&[], 14), 50.0);
    }

    #[test]
    fn rsi_bounds() {
        let prices = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        for end in 4..=prices.len() {
            let v = rsi(&prices[..end], 3);
            assert!((0.0..=100.0).contains(&v), "RSI out of bounds: {v}");
        }
    }
}
