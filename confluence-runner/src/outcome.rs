//! Outcome models: how an issued signal is judged correct or incorrect.
//!
//! Two models:
//! - `Simulated`: a Bernoulli draw with success probability from a declared,
//!   fixed `ProbabilityMapping` of the signal's confidence. The mapping is part
//!   of the run configuration and is reported with the results; it is never
//!   adjusted after seeing them.
//! - `Realized`: the path itself decides. BUY is correct iff the close
//!   `horizon` bars later is strictly higher than the close at signal time,
//!   SELL iff strictly lower.

use rand::Rng;
use serde::{Deserialize, Serialize};

use confluence_core::domain::Direction;

/// Confidence (percent) → success probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbabilityMapping {
    /// p = confidence / 100. A perfectly calibrated scorer.
    Identity,
    /// p = clamp(0.5 + slope * (confidence − pivot), floor, ceiling).
    Linear {
        pivot: f64,
        slope: f64,
        floor: f64,
        ceiling: f64,
    },
}

impl Default for ProbabilityMapping {
    fn default() -> Self {
        ProbabilityMapping::Linear {
            pivot: 50.0,
            slope: 0.005,
            floor: 0.05,
            ceiling: 0.95,
        }
    }
}

impl ProbabilityMapping {
    pub fn probability(&self, confidence: f64) -> f64 {
        let p = match *self {
            ProbabilityMapping::Identity => confidence / 100.0,
            ProbabilityMapping::Linear {
                pivot,
                slope,
                floor,
                ceiling,
            } => (0.5 + slope * (confidence - pivot)).clamp(floor, ceiling),
        };
        if p.is_nan() {
            0.5
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    /// Reject mappings that could not produce a probability.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            ProbabilityMapping::Identity => Ok(()),
            ProbabilityMapping::Linear {
                pivot,
                slope,
                floor,
                ceiling,
            } => {
                if !(pivot.is_finite() && slope.is_finite()) {
                    return Err("linear mapping needs finite pivot and slope".into());
                }
                if !(0.0..=1.0).contains(&floor) || !(0.0..=1.0).contains(&ceiling) {
                    return Err(format!(
                        "linear mapping floor/ceiling must lie in [0, 1], got {floor}/{ceiling}"
                    ));
                }
                if floor > ceiling {
                    return Err(format!("linear mapping floor {floor} exceeds ceiling {ceiling}"));
                }
                Ok(())
            }
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            ProbabilityMapping::Identity => "p = confidence / 100".to_string(),
            ProbabilityMapping::Linear {
                pivot,
                slope,
                floor,
                ceiling,
            } => format!("p = clamp(0.5 + {slope} * (confidence - {pivot}), {floor}, {ceiling})"),
        }
    }

    /// One Bernoulli draw at this mapping's probability.
    pub fn draw<R: Rng + ?Sized>(&self, confidence: f64, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.probability(confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum OutcomeModel {
    Simulated {
        #[serde(default)]
        mapping: ProbabilityMapping,
    },
    Realized {
        horizon: usize,
    },
}

impl Default for OutcomeModel {
    fn default() -> Self {
        OutcomeModel::Simulated {
            mapping: ProbabilityMapping::default(),
        }
    }
}

impl OutcomeModel {
    /// Bars needed after the scored bar.
    pub fn lookahead(&self) -> usize {
        match *self {
            OutcomeModel::Simulated { .. } => 0,
            OutcomeModel::Realized { horizon } => horizon,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            OutcomeModel::Simulated { mapping } => format!("simulated: {}", mapping.describe()),
            OutcomeModel::Realized { horizon } => {
                format!("realized: close {horizon} bar(s) ahead vs close at signal")
            }
        }
    }
}

/// Judge `direction` against the realized move. `None` for HOLD.
pub fn realized_outcome(direction: Direction, entry_close: f64, future_close: f64) -> Option<bool> {
    match direction {
        Direction::Buy => Some(future_close > entry_close),
        Direction::Sell => Some(future_close < entry_close),
        Direction::Hold => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_mapping_values() {
        let m = ProbabilityMapping::default();
        assert_eq!(m.probability(50.0), 0.5);
        assert!((m.probability(70.0) - 0.6).abs() < 1e-12);
        assert_eq!(m.probability(500.0), 0.95);
        assert_eq!(m.probability(-500.0), 0.05);
    }

    #[test]
    fn identity_mapping() {
        assert_eq!(ProbabilityMapping::Identity.probability(72.0), 0.72);
        assert_eq!(ProbabilityMapping::Identity.probability(120.0), 1.0);
    }

    #[test]
    fn mapping_is_monotonic() {
        let m = ProbabilityMapping::default();
        let mut prev = 0.0;
        for c in 0..=100 {
            let p = m.probability(c as f64);
            assert!(p >= prev);
            prev = p;
        }
    }

    #[test]
    fn invalid_mapping_rejected() {
        let m = ProbabilityMapping::Linear {
            pivot: 50.0,
            slope: 0.01,
            floor: 0.9,
            ceiling: 0.1,
        };
        assert!(m.validate().is_err());
        assert!(ProbabilityMapping::default().validate().is_ok());
    }

    #[test]
    fn draw_frequency_tracks_probability() {
        let m = ProbabilityMapping::Identity;
        let mut rng = StdRng::seed_from_u64(5);
        let hits = (0..20_000).filter(|_| m.draw(70.0, &mut rng)).count();
        let rate = hits as f64 / 20_000.0;
        assert!((rate - 0.70).abs() < 0.02, "rate = {rate}");
    }

    #[test]
    fn realized_requires_strict_move() {
        assert_eq!(realized_outcome(Direction::Buy, 100.0, 101.0), Some(true));
        assert_eq!(realized_outcome(Direction::Buy, 100.0, 100.0), Some(false));
        assert_eq!(realized_outcome(Direction::Sell, 100.0, 99.0), Some(true));
        assert_eq!(realized_outcome(Direction::Sell, 100.0, 100.0), Some(false));
        assert_eq!(realized_outcome(Direction::Hold, 100.0, 120.0), None);
    }

    #[test]
    fn outcome_model_toml_shape() {
        let model: OutcomeModel = toml::from_str("model = \"realized\"\nhorizon = 5").unwrap();
        assert_eq!(model, OutcomeModel::Realized { horizon: 5 });
        let model: OutcomeModel = toml::from_str("model = \"simulated\"").unwrap();
        assert_eq!(model, OutcomeModel::default());
    }
}
