//! TierRegistry: the named set of policies available to a run.
//!
//! Starts from the built-in presets; a TOML document can add tiers or replace
//! a built-in by name:
//!
//! ```toml
//! [[tier]]
//! name = "scalper"
//! confidence_threshold = 58.0
//! confidence_bounds = [30.0, 88.0]
//! min_confluent_factors = 2
//! target_accuracy_range = [50.0, 60.0]
//!
//! [tier.thresholds]
//! rsi_oversold = 32.0
//! # ...
//!
//! [tier.weights]
//! rsi_extreme = 7.0
//! # ...
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use super::{PolicyError, Tier, TierPolicy};

#[derive(Debug, Deserialize)]
struct TierFile {
    #[serde(default)]
    tier: Vec<TierPolicy>,
}

#[derive(Debug, Clone)]
pub struct TierRegistry {
    policies: BTreeMap<String, TierPolicy>,
}

impl TierRegistry {
    pub fn builtin() -> Self {
        let policies = Tier::ALL
            .iter()
            .map(|t| (t.name().to_string(), t.policy()))
            .collect();
        Self { policies }
    }

    /// Built-in presets overlaid with the tiers declared in `toml_str`.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, PolicyError> {
        Self::builtin().with_toml_str(toml_str)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, PolicyError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PolicyError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn with_toml_str(mut self, toml_str: &str) -> Result<Self, PolicyError> {
        let file: TierFile =
            toml::from_str(toml_str).map_err(|e| PolicyError::Parse(e.to_string()))?;

        let mut seen = HashSet::new();
        for policy in &file.tier {
            if !seen.insert(policy.name().to_string()) {
                return Err(PolicyError::DuplicateTier(policy.name().to_string()));
            }
        }

        for policy in file.tier {
            let name = policy.name().to_string();
            if self.policies.contains_key(&name) {
                tracing::debug!(tier = %name, version = policy.version(), "overriding tier policy");
            } else {
                tracing::debug!(tier = %name, version = policy.version(), "registering tier policy");
            }
            self.policies.insert(name, policy);
        }
        Ok(self)
    }

    /// Look up a tier by exact name, falling back to built-in aliases.
    pub fn get(&self, name: &str) -> Result<&TierPolicy, PolicyError> {
        if let Some(policy) = self.policies.get(name) {
            return Ok(policy);
        }
        let tier: Tier = name.parse()?;
        self.policies
            .get(tier.name())
            .ok_or_else(|| PolicyError::UnknownTier(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierPolicy> {
        self.policies.values()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
