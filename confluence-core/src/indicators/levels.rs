//! Support and resistance from the trailing range.
//!
//! support = min, resistance = max over the last `window` prices (the latest
//! included). The range is split into zones: the `strong_fraction` of the range
//! nearest each level is "strong", the rest of each half is "weak".
//! Fewer than `window` prices: a synthetic range of the last price ± 2%, which
//! always places the price mid-range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Where a price sits relative to support and resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelZone {
    StrongSupport,
    WeakSupport,
    WeakResistance,
    StrongResistance,
    /// Zero-width range: no level information.
    Flat,
}

impl SupportResistance {
    pub fn range(&self) -> f64 {
        self.resistance - self.support
    }

    /// Classify `price`. `strong_fraction` is clamped into [0, 0.5].
    pub fn zone(&self, price: f64, strong_fraction: f64) -> LevelZone {
        let range = self.range();
        if range <= 0.0 {
            return LevelZone::Flat;
        }
        let fraction = strong_fraction.clamp(0.0, 0.5);
        let position = (price - self.support) / range;
        if position <= fraction {
            LevelZone::StrongSupport
        } else if position >= 1.0 - fraction {
            LevelZone::StrongResistance
        } else if position < 0.5 {
            LevelZone::WeakSupport
        } else {
            LevelZone::WeakResistance
        }
    }
}

const DEGENERATE_HALF_RANGE: f64 = 0.02;

pub fn support_resistance(prices: &[f64], window: usize) -> SupportResistance {
    if window == 0 || prices.len() < window {
        let last = prices.last().copied().unwrap_or(0.0);
        return SupportResistance {
            support: last * (1.0 - DEGENERATE_HALF_RANGE),
            resistance: last * (1.0 + DEGENERATE_HALF_RANGE),
        };
    }
    let tail = &prices[prices.len() - window..];
    SupportResistance {
        support: tail.iter().copied().fold(f64::MAX, f64::min),
        resistance: tail.iter().copied().fold(f64::MIN, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_min_max() {
        let levels = support_resistance(&[50.0, 10.0, 12.0, 15.0, 11.0], 4);
        assert_eq!(levels.support, 10.0);
        assert_eq!(levels.resistance, 15.0);
    }

    #[test]
    fn zones_partition_the_range() {
        let levels = SupportResistance {
            support: 100.0,
            resistance: 200.0,
        };
        assert_eq!(levels.zone(105.0, 0.1), LevelZone::StrongSupport);
        assert_eq!(levels.zone(130.0, 0.1), LevelZone::WeakSupport);
        assert_eq!(levels.zone(150.0, 0.1), LevelZone::WeakResistance);
        assert_eq!(levels.zone(195.0, 0.1), LevelZone::StrongResistance);
        assert_eq!(levels.zone(200.0, 0.1), LevelZone::StrongResistance);
    }

    #[test]
    fn flat_range_has_no_zone() {
        let levels = support_resistance(&[100.0; 30], 20);
        assert_eq!(levels.zone(100.0, 0.1), LevelZone::Flat);
    }

    #[test]
    fn short_series_sits_mid_range() {
        let levels = support_resistance(&[100.0, 101.0, 99.0], 20);
        assert!(matches!(
            levels.zone(99.0, 0.1),
            LevelZone::WeakSupport | LevelZone::WeakResistance
        ));
        assert!((levels.support - 97.02).abs() < 1e-9);
    }
}
