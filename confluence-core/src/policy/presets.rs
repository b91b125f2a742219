//! Built-in tier presets.
//!
//! Three tiers trade signal frequency for accuracy:
//!
//! | tier         | target accuracy | threshold | min factors |
//! |--------------|-----------------|-----------|-------------|
//! | conservative | 45–55 %         | 55        | 1           |
//! | balanced     | 55–65 %         | 62        | 2           |
//! | aggressive   | 65–75 %         | 70        | 3           |
//!
//! "Aggressive" is aggressive about accuracy, not about trading: it demands
//! the most confluence and fires least often.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{IndicatorThresholds, PolicyError, TierDefinition, TierPolicy, WeightTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Conservative,
    Balanced,
    Aggressive,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Conservative, Tier::Balanced, Tier::Aggressive];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Conservative => "conservative",
            Tier::Balanced => "balanced",
            Tier::Aggressive => "aggressive",
        }
    }

    pub fn policy(self) -> TierPolicy {
        TierPolicy::from_preset(self.definition())
    }

    pub fn definition(self) -> TierDefinition {
        match self {
            Tier::Conservative => TierDefinition {
                name: self.name().into(),
                version: 1,
                description: "High frequency, wide thresholds, single-factor signals".into(),
                base_score: 50.0,
                confidence_threshold: 55.0,
                confidence_bounds: (30.0, 85.0),
                min_confluent_factors: 1,
                target_accuracy_range: (45.0, 55.0),
                thresholds: IndicatorThresholds {
                    rsi_oversold: 35.0,
                    rsi_bear_momentum: 48.0,
                    rsi_bull_momentum: 52.0,
                    rsi_overbought: 65.0,
                    macd_strong_pct: 0.10,
                    volume_thin: 0.6,
                    volume_elevated: 1.2,
                    volume_surge: 1.8,
                    strong_zone_fraction: 0.15,
                    band_edge: 0.1,
                    stoch_oversold: 20.0,
                    stoch_overbought: 80.0,
                },
                weights: WeightTable {
                    rsi_extreme: 5.0,
                    rsi_momentum: 4.0,
                    macd: 4.0,
                    macd_strong: 6.0,
                    ma_stack: 6.0,
                    ma_bias: 3.0,
                    level_strong: 4.0,
                    volume_elevated: 2.0,
                    volume_surge: 3.0,
                    volume_thin: 1.0,
                    band_reversion: 0.0,
                },
            },
            Tier::Balanced => TierDefinition {
                name: self.name().into(),
                version: 1,
                description: "Moderate frequency, two confirming factors".into(),
                base_score: 50.0,
                confidence_threshold: 62.0,
                confidence_bounds: (30.0, 90.0),
                min_confluent_factors: 2,
                target_accuracy_range: (55.0, 65.0),
                thresholds: IndicatorThresholds {
                    rsi_oversold: 30.0,
                    rsi_bear_momentum: 45.0,
                    rsi_bull_momentum: 55.0,
                    rsi_overbought: 70.0,
                    macd_strong_pct: 0.15,
                    volume_thin: 0.7,
                    volume_elevated: 1.3,
                    volume_surge: 2.0,
                    strong_zone_fraction: 0.10,
                    band_edge: 0.1,
                    stoch_oversold: 20.0,
                    stoch_overbought: 80.0,
                },
                weights: WeightTable {
                    rsi_extreme: 8.0,
                    rsi_momentum: 6.0,
                    macd: 6.0,
                    macd_strong: 9.0,
                    ma_stack: 10.0,
                    ma_bias: 5.0,
                    level_strong: 6.0,
                    volume_elevated: 3.0,
                    volume_surge: 5.0,
                    volume_thin: 2.0,
                    band_reversion: 0.0,
                },
            },
            Tier::Aggressive => TierDefinition {
                name: self.name().into(),
                version: 1,
                description: "Low frequency, tight thresholds, three or more factors".into(),
                base_score: 50.0,
                confidence_threshold: 70.0,
                confidence_bounds: (30.0, 95.0),
                min_confluent_factors: 3,
                target_accuracy_range: (65.0, 75.0),
                thresholds: IndicatorThresholds {
                    rsi_oversold: 25.0,
                    rsi_bear_momentum: 42.0,
                    rsi_bull_momentum: 58.0,
                    rsi_overbought: 75.0,
                    macd_strong_pct: 0.20,
                    volume_thin: 0.8,
                    volume_elevated: 1.5,
                    volume_surge: 2.5,
                    strong_zone_fraction: 0.08,
                    band_edge: 0.1,
                    stoch_oversold: 20.0,
                    stoch_overbought: 80.0,
                },
                weights: WeightTable {
                    rsi_extreme: 10.0,
                    rsi_momentum: 7.0,
                    macd: 7.0,
                    macd_strong: 11.0,
                    ma_stack: 12.0,
                    ma_bias: 6.0,
                    level_strong: 7.0,
                    volume_elevated: 4.0,
                    volume_surge: 6.0,
                    volume_thin: 3.0,
                    band_reversion: 0.0,
                },
            },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" | "random" | "random_trading" => Ok(Tier::Conservative),
            "balanced" | "market" | "market_average" => Ok(Tier::Balanced),
            "aggressive" | "professional" | "professional_traders" => Ok(Tier::Aggressive),
            _ => Err(PolicyError::UnknownTier(s.to_string())),
        }
    }
}
