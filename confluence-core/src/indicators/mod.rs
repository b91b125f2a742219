//! Indicator Library: pure numeric transforms of a price series.
//!
//! Every function takes plain slices and returns the value at the latest
//! sample. None of them fail: a series too short for the lookback returns the
//! documented neutral default instead. Calling a function twice on the same
//! input yields bit-identical output.

pub mod bollinger;
pub mod ema;
pub mod levels;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod volume;

pub use bollinger::{bollinger_bands, BollingerBands};
pub use ema::{ema, ema_series, sma};
pub use levels::{support_resistance, LevelZone, SupportResistance};
pub use macd::{macd, Macd};
pub use rsi::rsi;
pub use stochastic::{stochastic, Stochastic};
pub use volume::{trailing_average_volume, volume_ratio};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
