//! Indicator settings and the per-call indicator snapshot.
//!
//! A snapshot is derived from a `PriceSeries` on demand and never cached:
//! scoring the same series twice recomputes it and gets identical values.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::indicators::{
    bollinger_bands, ema, macd, rsi, sma, stochastic, support_resistance,
    trailing_average_volume, volume_ratio, BollingerBands, Stochastic, SupportResistance,
};

/// Periods for every indicator in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub stoch_k: usize,
    pub stoch_d: usize,
    /// Bars averaged for the volume baseline when the series carries none.
    pub volume_window: usize,
    pub level_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            ema_fast: 12,
            ema_slow: 26,
            sma_short: 20,
            sma_long: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            stoch_k: 14,
            stoch_d: 3,
            volume_window: 20,
            level_window: 20,
        }
    }
}

impl IndicatorSettings {
    /// Bars needed before every indicator leaves its degraded default.
    pub fn longest_lookback(&self) -> usize {
        [
            self.rsi_period + 1,
            self.ema_fast + 1,
            self.ema_slow + 1,
            self.sma_short,
            self.sma_long,
            self.macd_slow + self.macd_signal,
            self.bollinger_period,
            (self.stoch_k + self.stoch_d).saturating_sub(1),
            self.level_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Which family a moving average belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AverageKind {
    Ema,
    Sma,
}

/// One moving-average reading with its warmup status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageReading {
    pub kind: AverageKind,
    pub period: usize,
    pub value: f64,
    /// False when the series was too short and `value` is the degraded default.
    pub warmed: bool,
}

/// Indicator values at the series' latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub bar_count: usize,
    pub last_close: f64,
    pub rsi: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub volume_ratio: f64,
    pub support: f64,
    pub resistance: f64,
}

impl IndicatorSnapshot {
    pub fn compute(series: &PriceSeries, settings: &IndicatorSettings) -> Self {
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();

        let m = macd(
            &closes,
            settings.macd_fast,
            settings.macd_slow,
            settings.macd_signal,
        );
        let bb = bollinger_bands(&closes, settings.bollinger_period, settings.bollinger_k);
        let stoch = stochastic(&highs, &lows, &closes, settings.stoch_k, settings.stoch_d);
        let levels = support_resistance(&closes, settings.level_window);

        let baseline = series
            .baseline_volume()
            .unwrap_or_else(|| trailing_average_volume(&volumes, settings.volume_window));
        let latest_volume = volumes.last().copied().unwrap_or(0.0);

        Self {
            bar_count: closes.len(),
            last_close: closes.last().copied().unwrap_or(0.0),
            rsi: rsi(&closes, settings.rsi_period),
            sma_short: sma(&closes, settings.sma_short),
            sma_long: sma(&closes, settings.sma_long),
            ema_fast: ema(&closes, settings.ema_fast),
            ema_slow: ema(&closes, settings.ema_slow),
            macd_line: m.line,
            macd_signal: m.signal,
            macd_histogram: m.histogram,
            bb_upper: bb.upper,
            bb_middle: bb.middle,
            bb_lower: bb.lower,
            stoch_k: stoch.k,
            stoch_d: stoch.d,
            volume_ratio: volume_ratio(latest_volume, baseline),
            support: levels.support,
            resistance: levels.resistance,
        }
    }

    pub fn levels(&self) -> SupportResistance {
        SupportResistance {
            support: self.support,
            resistance: self.resistance,
        }
    }

    pub fn bands(&self) -> BollingerBands {
        BollingerBands {
            upper: self.bb_upper,
            middle: self.bb_middle,
            lower: self.bb_lower,
        }
    }

    pub fn stochastic(&self) -> Stochastic {
        Stochastic {
            k: self.stoch_k,
            d: self.stoch_d,
        }
    }

    /// The four moving averages ordered from fastest to slowest (by period,
    /// EMA before SMA on ties).
    pub fn averages(&self, settings: &IndicatorSettings) -> Vec<AverageReading> {
        let n = self.bar_count;
        let mut readings = vec![
            AverageReading {
                kind: AverageKind::Ema,
                period: settings.ema_fast,
                value: self.ema_fast,
                warmed: n > settings.ema_fast,
            },
            AverageReading {
                kind: AverageKind::Ema,
                period: settings.ema_slow,
                value: self.ema_slow,
                warmed: n > settings.ema_slow,
            },
            AverageReading {
                kind: AverageKind::Sma,
                period: settings.sma_short,
                value: self.sma_short,
                warmed: settings.sma_short > 0 && n >= settings.sma_short,
            },
            AverageReading {
                kind: AverageKind::Sma,
                period: settings.sma_long,
                value: self.sma_long,
                warmed: settings.sma_long > 0 && n >= settings.sma_long,
            },
        ];
        readings.sort_by_key(|r| (r.period, r.kind == AverageKind::Sma));
        readings
    }
}
