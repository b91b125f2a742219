//! Synthetic market scenarios and instrument profiles.
//!
//! A scenario is a (drift, volatility) pair for per-bar simple returns
//! `r ~ Normal(drift, volatility)`. `trending` picks its drift sign once per
//! path, so a trending path is persistently up or persistently down.
//!
//! Paths are daily, weekdays only. open = previous close, high/low widen the
//! open/close body by up to half the scenario volatility, and volume is the
//! instrument's baseline scaled by a uniform jitter.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use confluence_core::domain::{Bar, PriceSeries, SeriesError};

/// Volume multiplier range applied to the baseline on every bar.
const VOLUME_JITTER: (f64, f64) = (0.6, 1.8);

/// Returns are floored here so a price can never cross zero.
const MIN_RETURN: f64 = -0.5;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid return distribution for scenario {scenario}: {reason}")]
    Distribution { scenario: Scenario, reason: String },

    #[error("generated path is malformed: {0}")]
    Series(#[from] SeriesError),

    #[error("unknown scenario '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Normal,
    Bullish,
    Bearish,
    Volatile,
    Trending,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Normal,
        Scenario::Bullish,
        Scenario::Bearish,
        Scenario::Volatile,
        Scenario::Trending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::Bullish => "bullish",
            Scenario::Bearish => "bearish",
            Scenario::Volatile => "volatile",
            Scenario::Trending => "trending",
        }
    }

    /// (drift, volatility) per bar. Trending drift is unsigned here.
    pub fn params(self) -> (f64, f64) {
        match self {
            Scenario::Normal => (0.0, 0.015),
            Scenario::Bullish => (0.002, 0.012),
            Scenario::Bearish => (-0.002, 0.018),
            Scenario::Volatile => (0.0, 0.025),
            Scenario::Trending => (0.003, 0.010),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScenarioError::Unknown(s.to_string()))
    }
}

/// An instrument the harness can simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub name: String,
    pub base_price: f64,
    pub baseline_volume: f64,
}

impl InstrumentProfile {
    pub fn new(name: impl Into<String>, base_price: f64, baseline_volume: f64) -> Self {
        Self {
            name: name.into(),
            base_price,
            baseline_volume,
        }
    }

    /// The four index instruments used by default.
    pub fn defaults() -> Vec<InstrumentProfile> {
        vec![
            InstrumentProfile::new("NIFTY", 25_597.65, 75_000.0),
            InstrumentProfile::new("BANKNIFTY", 57_827.05, 45_000.0),
            InstrumentProfile::new("FINNIFTY", 27_195.80, 25_000.0),
            InstrumentProfile::new("SENSEX", 83_459.15, 40_000.0),
        ]
    }
}

fn path_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Generate `len` bars for `profile` under `scenario`, drawing from `rng`.
///
/// The returned series carries the profile's baseline volume.
pub fn generate_path(
    profile: &InstrumentProfile,
    scenario: Scenario,
    len: usize,
    rng: &mut StdRng,
) -> Result<PriceSeries, ScenarioError> {
    let (mut drift, volatility) = scenario.params();
    if scenario == Scenario::Trending && rng.gen_bool(0.5) {
        drift = -drift;
    }
    let returns = Normal::new(drift, volatility).map_err(|e| ScenarioError::Distribution {
        scenario,
        reason: e.to_string(),
    })?;

    let mut bars = Vec::with_capacity(len);
    let mut price = profile.base_price;
    let mut day = path_start();

    while bars.len() < len {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += Duration::days(1);
            continue;
        }

        let r = returns.sample(rng).max(MIN_RETURN);
        let open = price;
        let close = price * (1.0 + r);
        let high = open.max(close) * (1.0 + rng.gen::<f64>() * volatility * 0.5);
        let low = open.min(close) * (1.0 - rng.gen::<f64>() * volatility * 0.5);
        let volume = profile.baseline_volume * rng.gen_range(VOLUME_JITTER.0..VOLUME_JITTER.1);

        bars.push(Bar {
            timestamp: day,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        day += Duration::days(1);
    }

    Ok(PriceSeries::new(profile.name.clone(), bars)?.with_baseline_volume(profile.baseline_volume)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn nifty() -> InstrumentProfile {
        InstrumentProfile::defaults().remove(0)
    }

    #[test]
    fn path_has_requested_length_and_baseline() {
        let mut rng = StdRng::seed_from_u64(1);
        let series = generate_path(&nifty(), Scenario::Normal, 60, &mut rng).unwrap();
        assert_eq!(series.len(), 60);
        assert_eq!(series.instrument(), "NIFTY");
        assert_eq!(series.baseline_volume(), Some(75_000.0));
        assert_eq!(series.bars()[0].open, 25_597.65);
    }

    #[test]
    fn path_skips_weekends() {
        let mut rng = StdRng::seed_from_u64(2);
        let series = generate_path(&nifty(), Scenario::Volatile, 30, &mut rng).unwrap();
        for bar in series.bars() {
            assert!(!matches!(bar.timestamp.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn open_is_previous_close() {
        let mut rng = StdRng::seed_from_u64(3);
        let series = generate_path(&nifty(), Scenario::Bullish, 20, &mut rng).unwrap();
        for pair in series.bars().windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
        }
    }

    #[test]
    fn same_seed_same_path() {
        let a = generate_path(&nifty(), Scenario::Trending, 40, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = generate_path(&nifty(), Scenario::Trending, 40, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.bars(), b.bars());
    }

    #[test]
    fn bullish_drifts_up_on_average() {
        let profile = InstrumentProfile::new("X", 100.0, 1_000.0);
        let mut rng = StdRng::seed_from_u64(11);
        let mut total = 0.0;
        for _ in 0..200 {
            let s = generate_path(&profile, Scenario::Bullish, 100, &mut rng).unwrap();
            total += s.last().unwrap().close / 100.0 - 1.0;
        }
        assert!(total / 200.0 > 0.0);
    }

    #[test]
    fn scenario_parses_case_insensitively() {
        assert_eq!("Volatile".parse::<Scenario>().unwrap(), Scenario::Volatile);
        assert!("sideways".parse::<Scenario>().is_err());
    }
}
