//! Factor tags and per-category factor evaluation.
//!
//! Each indicator category yields exactly one `Factor`: a stable tag plus the
//! confidence points it carries under the active weight table. Whether a tag
//! counts toward BUY or SELL is decided by keywords in its name, never by its
//! points:
//!
//! - bullish: `BULL`, `OVERSOLD`, `SUPPORT`
//! - bearish: `BEAR`, `OVERBOUGHT`, `RESISTANCE`
//! - everything else is neutral; volume tags are always neutral.
//!
//! RSI extremes and strong-level touches are read against the moving-average
//! regime: RSI above the overbought line inside a bullish regime is momentum,
//! not exhaustion, and a strong-resistance touch inside a bullish regime is a
//! breakout. Symmetric for the bear side.
//!
//! The band/oscillator category is optional: it is only evaluated when the
//! policy gives it a positive weight. It reads mean reversion, a close at the
//! edge of the Bollinger band confirmed by a stochastic extreme, and stands
//! aside when the stretch runs with the moving-average regime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::{BollingerBands, LevelZone, Stochastic, SupportResistance};
use crate::policy::{IndicatorThresholds, WeightTable};
use crate::snapshot::AverageReading;

const BULLISH_KEYWORDS: [&str; 3] = ["BULL", "OVERSOLD", "SUPPORT"];
const BEARISH_KEYWORDS: [&str; 3] = ["BEAR", "OVERBOUGHT", "RESISTANCE"];

/// Relative tolerance below which two averages (or price and an average)
/// count as equal.
const ORDER_EPSILON: f64 = 1e-9;

/// |MACD histogram| in percent of price below which MACD reads flat.
const MACD_FLAT_PCT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorTag {
    RsiOversold,
    RsiOverbought,
    RsiBullMomentum,
    RsiBearMomentum,
    RsiNeutral,
    MacdBullStrong,
    MacdBullish,
    MacdBearStrong,
    MacdBearish,
    MacdFlat,
    MaBullStack,
    MaBearStack,
    MaBullBias,
    MaBearBias,
    MaMixed,
    MaWarmingUp,
    VolumeSurge,
    VolumeElevated,
    VolumeNormal,
    VolumeThin,
    AtStrongSupport,
    AtStrongResistance,
    SrBullBreakout,
    SrBearBreakdown,
    SrLowerRange,
    SrUpperRange,
    SrFlatRange,
    BandOversold,
    BandOverbought,
    BandTrendRide,
    BandInside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Rsi,
    Macd,
    MovingAverage,
    Volume,
    Levels,
    Bands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl FactorTag {
    /// Every tag, grouped by category.
    pub const ALL: [FactorTag; 31] = [
        FactorTag::RsiOversold,
        FactorTag::RsiOverbought,
        FactorTag::RsiBullMomentum,
        FactorTag::RsiBearMomentum,
        FactorTag::RsiNeutral,
        FactorTag::MacdBullStrong,
        FactorTag::MacdBullish,
        FactorTag::MacdBearStrong,
        FactorTag::MacdBearish,
        FactorTag::MacdFlat,
        FactorTag::MaBullStack,
        FactorTag::MaBearStack,
        FactorTag::MaBullBias,
        FactorTag::MaBearBias,
        FactorTag::MaMixed,
        FactorTag::MaWarmingUp,
        FactorTag::VolumeSurge,
        FactorTag::VolumeElevated,
        FactorTag::VolumeNormal,
        FactorTag::VolumeThin,
        FactorTag::AtStrongSupport,
        FactorTag::AtStrongResistance,
        FactorTag::SrBullBreakout,
        FactorTag::SrBearBreakdown,
        FactorTag::SrLowerRange,
        FactorTag::SrUpperRange,
        FactorTag::SrFlatRange,
        FactorTag::BandOversold,
        FactorTag::BandOverbought,
        FactorTag::BandTrendRide,
        FactorTag::BandInside,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FactorTag::RsiOversold => "RSI_OVERSOLD",
            FactorTag::RsiOverbought => "RSI_OVERBOUGHT",
            FactorTag::RsiBullMomentum => "RSI_BULL_MOMENTUM",
            FactorTag::RsiBearMomentum => "RSI_BEAR_MOMENTUM",
            FactorTag::RsiNeutral => "RSI_NEUTRAL",
            FactorTag::MacdBullStrong => "MACD_BULL_STRONG",
            FactorTag::MacdBullish => "MACD_BULLISH",
            FactorTag::MacdBearStrong => "MACD_BEAR_STRONG",
            FactorTag::MacdBearish => "MACD_BEARISH",
            FactorTag::MacdFlat => "MACD_FLAT",
            FactorTag::MaBullStack => "MA_BULL_STACK",
            FactorTag::MaBearStack => "MA_BEAR_STACK",
            FactorTag::MaBullBias => "MA_BULL_BIAS",
            FactorTag::MaBearBias => "MA_BEAR_BIAS",
            FactorTag::MaMixed => "MA_MIXED",
            FactorTag::MaWarmingUp => "MA_WARMING_UP",
            FactorTag::VolumeSurge => "VOLUME_SURGE",
            FactorTag::VolumeElevated => "VOLUME_ELEVATED",
            FactorTag::VolumeNormal => "VOLUME_NORMAL",
            FactorTag::VolumeThin => "VOLUME_THIN",
            FactorTag::AtStrongSupport => "AT_STRONG_SUPPORT",
            FactorTag::AtStrongResistance => "AT_STRONG_RESISTANCE",
            FactorTag::SrBullBreakout => "SR_BULL_BREAKOUT",
            FactorTag::SrBearBreakdown => "SR_BEAR_BREAKDOWN",
            FactorTag::SrLowerRange => "SR_LOWER_RANGE",
            FactorTag::SrUpperRange => "SR_UPPER_RANGE",
            FactorTag::SrFlatRange => "SR_FLAT_RANGE",
            FactorTag::BandOversold => "BAND_OVERSOLD",
            FactorTag::BandOverbought => "BAND_OVERBOUGHT",
            FactorTag::BandTrendRide => "BAND_TREND_RIDE",
            FactorTag::BandInside => "BAND_INSIDE",
        }
    }

    pub fn category(self) -> FactorCategory {
        use FactorTag::*;
        match self {
            RsiOversold | RsiOverbought | RsiBullMomentum | RsiBearMomentum | RsiNeutral => {
                FactorCategory::Rsi
            }
            MacdBullStrong | MacdBullish | MacdBearStrong | MacdBearish | MacdFlat => {
                FactorCategory::Macd
            }
            MaBullStack | MaBearStack | MaBullBias | MaBearBias | MaMixed | MaWarmingUp => {
                FactorCategory::MovingAverage
            }
            VolumeSurge | VolumeElevated | VolumeNormal | VolumeThin => FactorCategory::Volume,
            AtStrongSupport | AtStrongResistance | SrBullBreakout | SrBearBreakdown
            | SrLowerRange | SrUpperRange | SrFlatRange => FactorCategory::Levels,
            BandOversold | BandOverbought | BandTrendRide | BandInside => FactorCategory::Bands,
        }
    }

    pub fn bias(self) -> Bias {
        if self.category() == FactorCategory::Volume {
            return Bias::Neutral;
        }
        classify(self.as_str())
    }
}

impl fmt::Display for FactorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword classification of a tag name. A name matching both sides is neutral.
pub fn classify(name: &str) -> Bias {
    let bull = BULLISH_KEYWORDS.iter().any(|k| name.contains(k));
    let bear = BEARISH_KEYWORDS.iter().any(|k| name.contains(k));
    match (bull, bear) {
        (true, false) => Bias::Bullish,
        (false, true) => Bias::Bearish,
        _ => Bias::Neutral,
    }
}

/// (bullish, bearish) tag counts.
pub fn count_bias(tags: &[FactorTag]) -> (usize, usize) {
    tags.iter().fold((0, 0), |(bull, bear), tag| match tag.bias() {
        Bias::Bullish => (bull + 1, bear),
        Bias::Bearish => (bull, bear + 1),
        Bias::Neutral => (bull, bear),
    })
}

/// One evaluated category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub tag: FactorTag,
    /// Confidence points. Directional factors are non-negative; volume may be
    /// negative (thin volume deducts).
    pub points: f64,
}

impl Factor {
    fn new(tag: FactorTag, points: f64) -> Self {
        Self { tag, points }
    }
}

/// Moving-average regime, read from the stacking factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Bull,
    Bear,
    Neutral,
}

impl Regime {
    pub fn from_tag(tag: FactorTag) -> Self {
        match tag {
            FactorTag::MaBullStack | FactorTag::MaBullBias => Regime::Bull,
            FactorTag::MaBearStack | FactorTag::MaBearBias => Regime::Bear,
            _ => Regime::Neutral,
        }
    }
}

/// `averages` must be ordered fastest to slowest; unwarmed readings are skipped.
pub fn moving_average_factor(price: f64, averages: &[AverageReading], w: &WeightTable) -> Factor {
    let warmed: Vec<f64> = averages.iter().filter(|a| a.warmed).map(|a| a.value).collect();
    if warmed.is_empty() {
        return Factor::new(FactorTag::MaWarmingUp, 0.0);
    }

    let chain: Vec<f64> = std::iter::once(price).chain(warmed.iter().copied()).collect();
    if warmed.len() >= 2 {
        if chain.windows(2).all(|p| above(p[0], p[1])) {
            return Factor::new(FactorTag::MaBullStack, w.ma_stack);
        }
        if chain.windows(2).all(|p| above(p[1], p[0])) {
            return Factor::new(FactorTag::MaBearStack, w.ma_stack);
        }
    }
    if warmed.iter().all(|&avg| above(price, avg)) {
        return Factor::new(FactorTag::MaBullBias, w.ma_bias);
    }
    if warmed.iter().all(|&avg| above(avg, price)) {
        return Factor::new(FactorTag::MaBearBias, w.ma_bias);
    }
    Factor::new(FactorTag::MaMixed, 0.0)
}

pub fn rsi_factor(rsi: f64, regime: Regime, t: &IndicatorThresholds, w: &WeightTable) -> Factor {
    if rsi >= t.rsi_overbought {
        if regime == Regime::Bull {
            Factor::new(FactorTag::RsiBullMomentum, w.rsi_momentum)
        } else {
            Factor::new(FactorTag::RsiOverbought, w.rsi_extreme)
        }
    } else if rsi <= t.rsi_oversold {
        if regime == Regime::Bear {
            Factor::new(FactorTag::RsiBearMomentum, w.rsi_momentum)
        } else {
            Factor::new(FactorTag::RsiOversold, w.rsi_extreme)
        }
    } else if rsi >= t.rsi_bull_momentum {
        Factor::new(FactorTag::RsiBullMomentum, w.rsi_momentum)
    } else if rsi <= t.rsi_bear_momentum {
        Factor::new(FactorTag::RsiBearMomentum, w.rsi_momentum)
    } else {
        Factor::new(FactorTag::RsiNeutral, 0.0)
    }
}

/// Strength is the histogram relative to price, so thresholds carry across
/// instruments trading at different price levels.
pub fn macd_factor(histogram: f64, price: f64, t: &IndicatorThresholds, w: &WeightTable) -> Factor {
    let pct = if price > 0.0 {
        histogram.abs() / price * 100.0
    } else {
        0.0
    };
    if pct < MACD_FLAT_PCT {
        return Factor::new(FactorTag::MacdFlat, 0.0);
    }
    let strong = pct >= t.macd_strong_pct;
    match (histogram > 0.0, strong) {
        (true, true) => Factor::new(FactorTag::MacdBullStrong, w.macd_strong),
        (true, false) => Factor::new(FactorTag::MacdBullish, w.macd),
        (false, true) => Factor::new(FactorTag::MacdBearStrong, w.macd_strong),
        (false, false) => Factor::new(FactorTag::MacdBearish, w.macd),
    }
}

pub fn volume_factor(ratio: f64, t: &IndicatorThresholds, w: &WeightTable) -> Factor {
    if ratio >= t.volume_surge {
        Factor::new(FactorTag::VolumeSurge, w.volume_surge)
    } else if ratio >= t.volume_elevated {
        Factor::new(FactorTag::VolumeElevated, w.volume_elevated)
    } else if ratio < t.volume_thin {
        Factor::new(FactorTag::VolumeThin, -w.volume_thin)
    } else {
        Factor::new(FactorTag::VolumeNormal, 0.0)
    }
}

pub fn level_factor(
    price: f64,
    levels: &SupportResistance,
    regime: Regime,
    t: &IndicatorThresholds,
    w: &WeightTable,
) -> Factor {
    match levels.zone(price, t.strong_zone_fraction) {
        LevelZone::StrongSupport if regime == Regime::Bear => {
            Factor::new(FactorTag::SrBearBreakdown, w.level_strong)
        }
        LevelZone::StrongSupport => Factor::new(FactorTag::AtStrongSupport, w.level_strong),
        LevelZone::StrongResistance if regime == Regime::Bull => {
            Factor::new(FactorTag::SrBullBreakout, w.level_strong)
        }
        LevelZone::StrongResistance => Factor::new(FactorTag::AtStrongResistance, w.level_strong),
        LevelZone::WeakSupport => Factor::new(FactorTag::SrLowerRange, 0.0),
        LevelZone::WeakResistance => Factor::new(FactorTag::SrUpperRange, 0.0),
        LevelZone::Flat => Factor::new(FactorTag::SrFlatRange, 0.0),
    }
}

/// `None` when the policy gives the category no weight.
pub fn band_factor(
    price: f64,
    bands: &BollingerBands,
    stoch: &Stochastic,
    regime: Regime,
    t: &IndicatorThresholds,
    w: &WeightTable,
) -> Option<Factor> {
    if w.band_reversion <= 0.0 {
        return None;
    }
    // a zero-width band reads 0.5, never at an edge
    let position = bands.percent_b(price);
    let oversold = position <= t.band_edge
        && stoch.k <= t.stoch_oversold
        && stoch.d <= t.stoch_oversold;
    let overbought = position >= 1.0 - t.band_edge
        && stoch.k >= t.stoch_overbought
        && stoch.d >= t.stoch_overbought;

    let factor = match (oversold, overbought) {
        (true, _) if regime == Regime::Bear => Factor::new(FactorTag::BandTrendRide, 0.0),
        (true, _) => Factor::new(FactorTag::BandOversold, w.band_reversion),
        (_, true) if regime == Regime::Bull => Factor::new(FactorTag::BandTrendRide, 0.0),
        (_, true) => Factor::new(FactorTag::BandOverbought, w.band_reversion),
        _ => Factor::new(FactorTag::BandInside, 0.0),
    };
    Some(factor)
}

fn above(a: f64, b: f64) -> bool {
    a - b > ORDER_EPSILON * a.abs().max(b.abs()).max(1.0)
}
