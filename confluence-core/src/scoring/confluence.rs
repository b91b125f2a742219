//! ConfluenceScorer: one scorer for every tier.
//!
//! Pipeline per call:
//! 1. compute the `IndicatorSnapshot` for the series,
//! 2. evaluate the moving-average factor first (it sets the regime),
//! 3. evaluate RSI, MACD, volume and level factors under that regime, plus the
//!    band/oscillator factor when the policy weights it,
//! 4. confidence = base + (majority-side points − minority-side points)
//!    + volume points, clamped into the policy's bounds,
//! 5. resolve the direction from tag counts, confidence and the policy gates.
//!
//! Tie in bullish/bearish tag counts always resolves to HOLD.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::factors::{
    band_factor, count_bias, level_factor, macd_factor, moving_average_factor, rsi_factor,
    volume_factor, Bias, Factor, FactorCategory, FactorTag, Regime,
};
use super::{ScoreError, Scorer};
use crate::domain::{Bar, Direction, PriceSeries, SignalResult, HOLD_CONFIDENCE};
use crate::policy::TierPolicy;
use crate::snapshot::{IndicatorSettings, IndicatorSnapshot};

/// Full scoring trace for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// In evaluation order: RSI, MACD, moving averages, volume, levels, then
    /// bands when weighted.
    pub factors: Vec<Factor>,
    pub bullish_count: usize,
    pub bearish_count: usize,
    /// Score before clamping.
    pub raw_score: f64,
    pub direction: Direction,
    pub confidence: f64,
}

impl Evaluation {
    pub fn tags(&self) -> Vec<FactorTag> {
        self.factors.iter().map(|f| f.tag).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ConfluenceScorer {
    policy: TierPolicy,
    settings: IndicatorSettings,
}

impl ConfluenceScorer {
    pub fn new(policy: TierPolicy) -> Self {
        Self::with_settings(policy, IndicatorSettings::default())
    }

    pub fn with_settings(policy: TierPolicy, settings: IndicatorSettings) -> Self {
        Self { policy, settings }
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Evaluation {
        let t = self.policy.thresholds();
        let w = self.policy.weights();
        let price = snapshot.last_close;

        let ma = moving_average_factor(price, &snapshot.averages(&self.settings), w);
        let regime = Regime::from_tag(ma.tag);

        let mut factors = vec![
            rsi_factor(snapshot.rsi, regime, t, w),
            macd_factor(snapshot.macd_histogram, price, t, w),
            ma,
            volume_factor(snapshot.volume_ratio, t, w),
            level_factor(price, &snapshot.levels(), regime, t, w),
        ];
        factors.extend(band_factor(
            price,
            &snapshot.bands(),
            &snapshot.stochastic(),
            regime,
            t,
            w,
        ));
        let tags: Vec<FactorTag> = factors.iter().map(|f| f.tag).collect();
        let (bullish_count, bearish_count) = count_bias(&tags);

        let raw_score = raw_score(&factors, bullish_count, bearish_count, self.policy.base_score());
        let (floor, ceiling) = self.policy.confidence_bounds();
        let (direction, confidence) =
            resolve_direction(&tags, raw_score.clamp(floor, ceiling), &self.policy);

        Evaluation {
            factors,
            bullish_count,
            bearish_count,
            raw_score,
            direction,
            confidence,
        }
    }

    /// Score the latest bar of `snapshot` without a series at hand.
    pub fn score_snapshot(
        &self,
        instrument: &str,
        as_of: Option<NaiveDateTime>,
        snapshot: IndicatorSnapshot,
    ) -> SignalResult {
        let eval = self.evaluate(&snapshot);
        SignalResult {
            instrument: instrument.to_string(),
            tier: self.policy.name().to_string(),
            as_of,
            direction: eval.direction,
            confidence: eval.confidence,
            contributing_factors: eval.tags(),
            bullish_count: eval.bullish_count,
            bearish_count: eval.bearish_count,
            indicator_snapshot: snapshot,
        }
    }

    /// Validate raw bars into a series, then score it.
    pub fn score_bars(&self, instrument: &str, bars: Vec<Bar>) -> Result<SignalResult, ScoreError> {
        let series = PriceSeries::new(instrument, bars)?;
        self.score(&series)
    }
}

impl Scorer for ConfluenceScorer {
    fn score(&self, series: &PriceSeries) -> Result<SignalResult, ScoreError> {
        let Some(last) = series.last() else {
            return Err(ScoreError::EmptySeries);
        };
        let as_of = Some(last.timestamp);
        let snapshot = IndicatorSnapshot::compute(series, &self.settings);
        Ok(self.score_snapshot(series.instrument(), as_of, snapshot))
    }

    fn policy(&self) -> &TierPolicy {
        &self.policy
    }
}

/// Apply the direction gates to already-clamped `confidence`.
///
/// BUY needs bullish tags ≥ `min_confluent_factors`, bullish > bearish and
/// confidence ≥ threshold; SELL is symmetric. Anything else is HOLD at 50.
pub fn resolve_direction(
    tags: &[FactorTag],
    confidence: f64,
    policy: &TierPolicy,
) -> (Direction, f64) {
    let (bull, bear) = count_bias(tags);
    let min = policy.min_confluent_factors();
    let confident = confidence >= policy.confidence_threshold();

    if bull > bear && bull >= min && confident {
        (Direction::Buy, confidence)
    } else if bear > bull && bear >= min && confident {
        (Direction::Sell, confidence)
    } else {
        (Direction::Hold, HOLD_CONFIDENCE)
    }
}

fn raw_score(factors: &[Factor], bull: usize, bear: usize, base: f64) -> f64 {
    let side = if bull > bear {
        Bias::Bullish
    } else if bear > bull {
        Bias::Bearish
    } else {
        return base;
    };

    let mut with = 0.0;
    let mut against = 0.0;
    let mut volume = 0.0;
    for f in factors {
        match f.tag.bias() {
            Bias::Neutral if f.tag.category() == FactorCategory::Volume => volume += f.points,
            Bias::Neutral => {}
            b if b == side => with += f.points,
            _ => against += f.points,
        }
    }
    base + with - against + volume
}
