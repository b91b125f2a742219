//! Exponential and simple moving averages.
//!
//! EMA recursion: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (period + 1), seeded with the SMA of the first `period` values.
//!
//! Degraded behavior: `ema` needs more than `period` samples for a smoothed
//! value. With `period` samples or fewer it returns the last sample (0.0 for an
//! empty slice). `sma` needs at least `period` samples and degrades the same way.

/// EMA at the latest sample.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() <= period {
        return last_or_zero(prices);
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;
    prices[period..]
        .iter()
        .fold(seed, |prev, &x| alpha * x + (1.0 - alpha) * prev)
}

/// Full EMA series over `values`, same length as the input.
///
/// Index `period - 1` holds the SMA seed; earlier indices are NaN (warmup).
/// Used by MACD, which needs the EMA of a derived series.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        let v = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = v;
        prev = v;
    }

    result
}

/// Simple moving average of the trailing `period` samples.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return last_or_zero(prices);
    }
    prices[prices.len() - period..].iter().sum::<f64>() / period as f64
}

fn last_or_zero(prices: &[f64]) -> f64 {
    prices.last().copied().unwrap_or(0.0)
}
