//! Serializable calibration configuration.
//!
//! Every field has a declared default, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! iterations = 5000
//! seed = 7
//! scenarios = ["bullish", "bearish"]
//! history_len = 80
//!
//! [outcome]
//! model = "realized"
//! horizon = 5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use confluence_core::snapshot::IndicatorSettings;

use crate::outcome::OutcomeModel;
use crate::scenario::{InstrumentProfile, Scenario};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Monte Carlo iterations per tier.
    pub iterations: usize,
    /// Master seed for the RNG hierarchy.
    pub seed: u64,
    /// Scenarios drawn uniformly per iteration.
    pub scenarios: Vec<Scenario>,
    /// Instruments drawn uniformly per iteration.
    pub instruments: Vec<InstrumentProfile>,
    /// Bars in each scored window.
    pub history_len: usize,
    pub outcome: OutcomeModel,
    /// Run iterations on the rayon pool. Results are identical either way.
    pub parallel: bool,
    pub indicators: IndicatorSettings,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            seed: 42,
            scenarios: Scenario::ALL.to_vec(),
            instruments: InstrumentProfile::defaults(),
            history_len: 60,
            outcome: OutcomeModel::default(),
            parallel: true,
            indicators: IndicatorSettings::default(),
        }
    }
}

impl CalibrationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be at least 1".into()));
        }
        if self.scenarios.is_empty() {
            return Err(ConfigError::Invalid("at least one scenario is required".into()));
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("at least one instrument is required".into()));
        }
        if self.history_len == 0 {
            return Err(ConfigError::Invalid("history_len must be at least 1".into()));
        }
        for inst in &self.instruments {
            if !(inst.base_price.is_finite() && inst.base_price > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "instrument {}: base_price must be positive, got {}",
                    inst.name, inst.base_price
                )));
            }
            if !(inst.baseline_volume.is_finite() && inst.baseline_volume > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "instrument {}: baseline_volume must be positive, got {}",
                    inst.name, inst.baseline_volume
                )));
            }
        }
        match self.outcome {
            OutcomeModel::Simulated { mapping } => {
                mapping.validate().map_err(ConfigError::Invalid)?
            }
            OutcomeModel::Realized { horizon } if horizon == 0 => {
                return Err(ConfigError::Invalid("realized horizon must be at least 1".into()));
            }
            OutcomeModel::Realized { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ProbabilityMapping;

    #[test]
    fn defaults_are_valid() {
        let config = CalibrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scenarios.len(), 5);
        assert_eq!(config.instruments.len(), 4);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CalibrationConfig::from_toml_str(
            r#"
iterations = 250
scenarios = ["bullish", "volatile"]

[outcome]
model = "realized"
horizon = 3
"#,
        )
        .unwrap();
        assert_eq!(config.iterations, 250);
        assert_eq!(config.seed, 42);
        assert_eq!(config.scenarios, vec![Scenario::Bullish, Scenario::Volatile]);
        assert_eq!(config.outcome, OutcomeModel::Realized { horizon: 3 });
        assert_eq!(config.indicators.rsi_period, 14);
    }

    #[test]
    fn custom_instruments_and_mapping() {
        let config = CalibrationConfig::from_toml_str(
            r#"
[[instruments]]
name = "TEST"
base_price = 100.0
baseline_volume = 1000.0

[outcome]
model = "simulated"

[outcome.mapping]
kind = "identity"
"#,
        )
        .unwrap();
        assert_eq!(config.instruments.len(), 1);
        assert_eq!(
            config.outcome,
            OutcomeModel::Simulated {
                mapping: ProbabilityMapping::Identity
            }
        );
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(matches!(
            CalibrationConfig::from_toml_str("iterations = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_scenario_is_parse_error() {
        assert!(matches!(
            CalibrationConfig::from_toml_str("scenarios = [\"sideways\"]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_horizon_rejected() {
        let config = CalibrationConfig {
            outcome: OutcomeModel::Realized { horizon: 0 },
            ..CalibrationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CalibrationConfig::from_file(Path::new("/nonexistent/calibration.toml"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }
}
