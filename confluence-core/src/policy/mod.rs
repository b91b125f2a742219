//! Tier policies: static, versioned scoring configuration.
//!
//! A `TierPolicy` is a value object: thresholds, a weight table, the minimum
//! number of confluent factors and the target accuracy band. It can only be
//! obtained through validation (`TryFrom<TierDefinition>`, which serde also uses
//! on deserialization), so an out-of-bounds policy is rejected when it is
//! built and never reaches the scorer.

pub mod presets;
pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use presets::Tier;
pub use registry::TierRegistry;

/// Indicator cut-offs used by the scorer to classify readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorThresholds {
    pub rsi_oversold: f64,
    pub rsi_bear_momentum: f64,
    pub rsi_bull_momentum: f64,
    pub rsi_overbought: f64,
    /// |MACD histogram| as a percentage of the last close at which the MACD
    /// reading counts as strong.
    pub macd_strong_pct: f64,
    pub volume_thin: f64,
    pub volume_elevated: f64,
    pub volume_surge: f64,
    /// Fraction of the support/resistance range treated as a strong zone.
    pub strong_zone_fraction: f64,
    /// %b within this distance of a band counts as touching it
    /// (band/oscillator category).
    #[serde(default = "default_band_edge")]
    pub band_edge: f64,
    /// %K and %D at or below this read oversold.
    #[serde(default = "default_stoch_oversold")]
    pub stoch_oversold: f64,
    #[serde(default = "default_stoch_overbought")]
    pub stoch_overbought: f64,
}

/// Confidence points granted per factor category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub rsi_extreme: f64,
    pub rsi_momentum: f64,
    pub macd: f64,
    pub macd_strong: f64,
    pub ma_stack: f64,
    pub ma_bias: f64,
    pub level_strong: f64,
    pub volume_elevated: f64,
    pub volume_surge: f64,
    /// Deducted when volume is thin.
    pub volume_thin: f64,
    /// Band/oscillator mean-reversion points. Zero leaves the category out.
    #[serde(default)]
    pub band_reversion: f64,
}

/// Unvalidated tier record, as written in TOML or in the built-in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub confidence_threshold: f64,
    /// (floor, ceiling) the raw score is clamped into.
    pub confidence_bounds: (f64, f64),
    pub min_confluent_factors: usize,
    /// Accuracy band in percent, inclusive on both ends.
    pub target_accuracy_range: (f64, f64),
    pub thresholds: IndicatorThresholds,
    pub weights: WeightTable,
}

fn default_version() -> u32 {
    1
}

fn default_base_score() -> f64 {
    50.0
}

fn default_band_edge() -> f64 {
    0.1
}

fn default_stoch_oversold() -> f64 {
    20.0
}

fn default_stoch_overbought() -> f64 {
    80.0
}

/// A policy that violates its declared bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("tier name must not be empty")]
    EmptyName,

    #[error("tier '{tier}': {field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        tier: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("tier '{tier}': {field} lower value {lo} exceeds upper value {hi}")]
    InvertedRange {
        tier: String,
        field: &'static str,
        lo: f64,
        hi: f64,
    },

    #[error("tier '{tier}': min_confluent_factors must be at least 1")]
    ZeroConfluentFactors { tier: String },

    #[error("tier '{tier}': weight {field} must be finite and non-negative, got {value}")]
    InvalidWeight {
        tier: String,
        field: &'static str,
        value: f64,
    },

    #[error("failed to parse tier definitions: {0}")]
    Parse(String),

    #[error("tier '{0}' is defined more than once")]
    DuplicateTier(String),

    #[error("unknown tier '{0}'")]
    UnknownTier(String),
}

/// A validated tier policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TierDefinition", into = "TierDefinition")]
pub struct TierPolicy {
    def: TierDefinition,
}

impl TryFrom<TierDefinition> for TierPolicy {
    type Error = PolicyError;

    fn try_from(def: TierDefinition) -> Result<Self, Self::Error> {
        validate(&def)?;
        Ok(Self { def })
    }
}

impl From<TierPolicy> for TierDefinition {
    fn from(policy: TierPolicy) -> Self {
        policy.def
    }
}

impl TierPolicy {
    /// Built-in presets are checked by unit tests rather than at runtime.
    pub(crate) fn from_preset(def: TierDefinition) -> Self {
        debug_assert!(validate(&def).is_ok(), "invalid preset {}", def.name);
        Self { def }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn version(&self) -> u32 {
        self.def.version
    }

    pub fn description(&self) -> &str {
        &self.def.description
    }

    pub fn base_score(&self) -> f64 {
        self.def.base_score
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.def.confidence_threshold
    }

    pub fn confidence_bounds(&self) -> (f64, f64) {
        self.def.confidence_bounds
    }

    pub fn min_confluent_factors(&self) -> usize {
        self.def.min_confluent_factors
    }

    pub fn target_accuracy_range(&self) -> (f64, f64) {
        self.def.target_accuracy_range
    }

    pub fn thresholds(&self) -> &IndicatorThresholds {
        &self.def.thresholds
    }

    pub fn weights(&self) -> &WeightTable {
        &self.def.weights
    }

    pub fn definition(&self) -> &TierDefinition {
        &self.def
    }

    /// Whether `accuracy` (percent) falls inside the target band, inclusive.
    pub fn accepts_accuracy(&self, accuracy: f64) -> bool {
        let (min, max) = self.def.target_accuracy_range;
        (min..=max).contains(&accuracy)
    }

    /// Content hash of the policy, stable across runs for identical definitions.
    pub fn fingerprint(&self) -> String {
        // Serializing plain numbers and strings cannot fail.
        let json = serde_json::to_string(&self.def).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn validate(def: &TierDefinition) -> Result<(), PolicyError> {
    if def.name.trim().is_empty() {
        return Err(PolicyError::EmptyName);
    }
    let tier = def.name.as_str();

    check_range(tier, "base_score", def.base_score, 0.0, 100.0)?;
    let (floor, ceiling) = def.confidence_bounds;
    check_range(tier, "confidence_bounds.floor", floor, 0.0, 100.0)?;
    check_range(tier, "confidence_bounds.ceiling", ceiling, 0.0, 100.0)?;
    check_order(tier, "confidence_bounds", floor, ceiling)?;
    check_range(
        tier,
        "confidence_threshold",
        def.confidence_threshold,
        0.0,
        ceiling,
    )?;

    let (target_min, target_max) = def.target_accuracy_range;
    check_range(tier, "target_accuracy_range.min", target_min, 0.0, 100.0)?;
    check_range(tier, "target_accuracy_range.max", target_max, 0.0, 100.0)?;
    check_order(tier, "target_accuracy_range", target_min, target_max)?;

    if def.min_confluent_factors == 0 {
        return Err(PolicyError::ZeroConfluentFactors {
            tier: tier.to_string(),
        });
    }

    let t = &def.thresholds;
    for (field, value) in [
        ("rsi_oversold", t.rsi_oversold),
        ("rsi_bear_momentum", t.rsi_bear_momentum),
        ("rsi_bull_momentum", t.rsi_bull_momentum),
        ("rsi_overbought", t.rsi_overbought),
    ] {
        check_range(tier, field, value, 0.0, 100.0)?;
    }
    check_order(tier, "rsi_oversold..rsi_bear_momentum", t.rsi_oversold, t.rsi_bear_momentum)?;
    check_order(
        tier,
        "rsi_bear_momentum..rsi_bull_momentum",
        t.rsi_bear_momentum,
        t.rsi_bull_momentum,
    )?;
    check_order(
        tier,
        "rsi_bull_momentum..rsi_overbought",
        t.rsi_bull_momentum,
        t.rsi_overbought,
    )?;
    check_range(tier, "macd_strong_pct", t.macd_strong_pct, 0.0, f64::MAX)?;
    check_range(tier, "volume_thin", t.volume_thin, 0.0, f64::MAX)?;
    check_order(tier, "volume_thin..volume_elevated", t.volume_thin, t.volume_elevated)?;
    check_order(tier, "volume_elevated..volume_surge", t.volume_elevated, t.volume_surge)?;
    check_range(tier, "volume_surge", t.volume_surge, 0.0, f64::MAX)?;
    check_range(tier, "strong_zone_fraction", t.strong_zone_fraction, 0.0, 0.5)?;
    check_range(tier, "band_edge", t.band_edge, 0.0, 0.5)?;
    check_range(tier, "stoch_oversold", t.stoch_oversold, 0.0, 100.0)?;
    check_range(tier, "stoch_overbought", t.stoch_overbought, 0.0, 100.0)?;
    check_order(
        tier,
        "stoch_oversold..stoch_overbought",
        t.stoch_oversold,
        t.stoch_overbought,
    )?;

    let w = &def.weights;
    for (field, value) in [
        ("rsi_extreme", w.rsi_extreme),
        ("rsi_momentum", w.rsi_momentum),
        ("macd", w.macd),
        ("macd_strong", w.macd_strong),
        ("ma_stack", w.ma_stack),
        ("ma_bias", w.ma_bias),
        ("level_strong", w.level_strong),
        ("volume_elevated", w.volume_elevated),
        ("volume_surge", w.volume_surge),
        ("volume_thin", w.volume_thin),
        ("band_reversion", w.band_reversion),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(PolicyError::InvalidWeight {
                tier: tier.to_string(),
                field,
                value,
            });
        }
    }

    Ok(())
}

fn check_range(tier: &str, field: &'static str, value: f64, min: f64, max: f64) -> Result<(), PolicyError> {
    // NaN fails `contains`
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::OutOfRange {
            tier: tier.to_string(),
            field,
            value,
            min,
            max,
        })
    }
}

fn check_order(tier: &str, field: &'static str, lo: f64, hi: f64) -> Result<(), PolicyError> {
    if lo <= hi {
        Ok(())
    } else {
        Err(PolicyError::InvertedRange {
            tier: tier.to_string(),
            field,
            lo,
            hi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> TierDefinition {
        Tier::Balanced.definition()
    }

    #[test]
    fn presets_validate() {
        for tier in Tier::ALL {
            assert!(
                TierPolicy::try_from(tier.definition()).is_ok(),
                "{tier:?} preset failed validation"
            );
        }
    }

    #[test]
    fn threshold_above_hundred_rejected() {
        let mut def = balanced();
        def.confidence_bounds = (30.0, 100.0);
        def.confidence_threshold = 101.0;
        let err = TierPolicy::try_from(def).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::OutOfRange {
                field: "confidence_threshold",
                ..
            }
        ));
    }

    #[test]
    fn negative_threshold_rejected() {
        let mut def = balanced();
        def.confidence_threshold = -1.0;
        assert!(TierPolicy::try_from(def).is_err());
    }

    #[test]
    fn threshold_above_ceiling_rejected() {
        let mut def = balanced();
        def.confidence_bounds = (30.0, 60.0);
        def.confidence_threshold = 65.0;
        assert!(TierPolicy::try_from(def).is_err());
    }

    #[test]
    fn inverted_target_range_rejected() {
        let mut def = balanced();
        def.target_accuracy_range = (65.0, 55.0);
        assert!(matches!(
            TierPolicy::try_from(def),
            Err(PolicyError::InvertedRange { .. })
        ));
    }

    #[test]
    fn zero_confluent_factors_rejected() {
        let mut def = balanced();
        def.min_confluent_factors = 0;
        assert!(matches!(
            TierPolicy::try_from(def),
            Err(PolicyError::ZeroConfluentFactors { .. })
        ));
    }

    #[test]
    fn nan_weight_rejected() {
        let mut def = balanced();
        def.weights.macd = f64::NAN;
        assert!(matches!(
            TierPolicy::try_from(def),
            Err(PolicyError::InvalidWeight { field: "macd", .. })
        ));
    }

    #[test]
    fn negative_band_weight_rejected() {
        let mut def = balanced();
        def.weights.band_reversion = -2.0;
        assert!(matches!(
            TierPolicy::try_from(def),
            Err(PolicyError::InvalidWeight {
                field: "band_reversion",
                ..
            })
        ));
    }

    #[test]
    fn inverted_stochastic_zones_rejected() {
        let mut def = balanced();
        def.thresholds.stoch_oversold = 85.0;
        assert!(matches!(
            TierPolicy::try_from(def),
            Err(PolicyError::InvertedRange {
                field: "stoch_oversold..stoch_overbought",
                ..
            })
        ));
    }

    #[test]
    fn unordered_rsi_zones_rejected() {
        let mut def = balanced();
        def.thresholds.rsi_oversold = 60.0;
        assert!(TierPolicy::try_from(def).is_err());
    }

    #[test]
    fn empty_name_rejected() {
        let mut def = balanced();
        def.name = "  ".into();
        assert_eq!(TierPolicy::try_from(def), Err(PolicyError::EmptyName));
    }

    #[test]
    fn accepts_accuracy_is_inclusive() {
        let policy = Tier::Balanced.policy();
        assert!(policy.accepts_accuracy(55.0));
        assert!(policy.accepts_accuracy(65.0));
        assert!(!policy.accepts_accuracy(65.01));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Tier::Balanced.policy();
        let b = Tier::Balanced.policy();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), Tier::Aggressive.policy().fingerprint());
    }

    #[test]
    fn deserialization_validates() {
        let mut def = balanced();
        def.confidence_threshold = 150.0;
        let json = serde_json::to_string(&def).unwrap();
        assert!(serde_json::from_str::<TierPolicy>(&json).is_err());

        let json = serde_json::to_string(&balanced()).unwrap();
        let policy: TierPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy.name(), "balanced");
    }
}
