//! Calibration Monte Carlo: measures a tier's realized accuracy.
//!
//! Per iteration:
//! 1. derive the path RNG from `(master seed, "path", iteration)` and draw a
//!    scenario and an instrument from it,
//! 2. generate `history_len` bars (plus the outcome lookahead),
//! 3. score the first `history_len` bars,
//! 4. HOLD → counted as a hold, nothing else; BUY/SELL → judged by the
//!    configured outcome model (simulated draws use the
//!    `"outcome/<tier>"` stream).
//!
//! Paths do not depend on the tier, so every tier is measured on the same
//! markets. Iterations produce independent `Tally` values that are merged with
//! an associative, integer-only `Tally::merge`, so parallel and sequential
//! runs produce identical reports.

use std::collections::BTreeMap;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use confluence_core::domain::{Direction, PriceSeries};
use confluence_core::policy::TierPolicy;
use confluence_core::rng::RngHierarchy;
use confluence_core::scoring::{ConfluenceScorer, ScoreError, Scorer};

use crate::config::{CalibrationConfig, ConfigError};
use crate::outcome::{realized_outcome, OutcomeModel};
use crate::scenario::{generate_path, ScenarioError};

/// Scenario label used for replayed history.
pub const HISTORICAL: &str = "historical";

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("no instruments configured")]
    NoInstruments,

    #[error("no scenarios configured")]
    NoScenarios,

    #[error("iterations must be at least 1")]
    ZeroIterations,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scoring failed: {0}")]
    Score(#[from] ScoreError),

    #[error("scenario generation failed: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("replay needs at least {required} bars, series has {bars}")]
    InsufficientReplayHistory { bars: usize, required: usize },

    #[error("invalid replay settings: {0}")]
    InvalidReplay(String),
}

// ─── Tally ───────────────────────────────────────────────────────────

/// Issued signals and how many were correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub signals: usize,
    pub correct: usize,
}

impl Bucket {
    fn record(&mut self, correct: bool) {
        self.signals += 1;
        if correct {
            self.correct += 1;
        }
    }

    fn merge(self, other: Bucket) -> Bucket {
        Bucket {
            signals: self.signals + other.signals,
            correct: self.correct + other.correct,
        }
    }

    /// Percent correct, `None` when no signal was issued.
    pub fn accuracy(&self) -> Option<f64> {
        (self.signals > 0).then(|| self.correct as f64 / self.signals as f64 * 100.0)
    }
}

/// Counts accumulated over a set of iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub iterations: usize,
    pub holds: usize,
    pub overall: Bucket,
    pub by_direction: BTreeMap<Direction, Bucket>,
    pub by_scenario: BTreeMap<String, Bucket>,
    pub by_confidence: BTreeMap<String, Bucket>,
}

impl Tally {
    pub fn hold() -> Self {
        Self {
            iterations: 1,
            holds: 1,
            ..Self::default()
        }
    }

    pub fn signal(direction: Direction, scenario: &str, confidence: f64, correct: bool) -> Self {
        let mut tally = Self {
            iterations: 1,
            ..Self::default()
        };
        tally.overall.record(correct);
        tally.by_direction.entry(direction).or_default().record(correct);
        tally
            .by_scenario
            .entry(scenario.to_string())
            .or_default()
            .record(correct);
        tally
            .by_confidence
            .entry(confidence_band(confidence))
            .or_default()
            .record(correct);
        tally
    }

    /// Associative and commutative.
    pub fn merge(mut self, other: Tally) -> Tally {
        self.iterations += other.iterations;
        self.holds += other.holds;
        self.overall = self.overall.merge(other.overall);
        merge_map(&mut self.by_direction, other.by_direction);
        merge_map(&mut self.by_scenario, other.by_scenario);
        merge_map(&mut self.by_confidence, other.by_confidence);
        self
    }
}

fn merge_map<K: Ord>(into: &mut BTreeMap<K, Bucket>, from: BTreeMap<K, Bucket>) {
    for (key, bucket) in from {
        let slot = into.entry(key).or_default();
        *slot = slot.merge(bucket);
    }
}

/// Ten-point band label, e.g. `"70-80"`. 100 falls in `"90-100"`.
pub fn confidence_band(confidence: f64) -> String {
    let lo = ((confidence / 10.0).floor() * 10.0).clamp(0.0, 90.0) as u32;
    format!("{}-{}", lo, lo + 10)
}

// ─── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub signals: usize,
    pub correct: usize,
    pub accuracy: Option<f64>,
}

impl From<Bucket> for BucketStats {
    fn from(b: Bucket) -> Self {
        Self {
            signals: b.signals,
            correct: b.correct,
            accuracy: b.accuracy(),
        }
    }
}

/// Aggregate result of one calibration (or replay) run for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRun {
    pub tier: String,
    pub policy_version: u32,
    pub policy_fingerprint: String,
    pub iterations: usize,
    pub total_signals: usize,
    pub holds: usize,
    pub correct: usize,
    /// Percent correct among issued signals; `None` when nothing was issued.
    pub accuracy: Option<f64>,
    /// Issued signals as a percent of iterations.
    pub issue_rate: f64,
    pub target_range: (f64, f64),
    pub target_achieved: bool,
    pub breakdown_by_direction: BTreeMap<Direction, BucketStats>,
    pub breakdown_by_scenario: BTreeMap<String, BucketStats>,
    pub breakdown_by_confidence: BTreeMap<String, BucketStats>,
    pub outcome_model: String,
    pub seed: u64,
}

fn stats<K: Ord>(buckets: BTreeMap<K, Bucket>) -> BTreeMap<K, BucketStats> {
    buckets.into_iter().map(|(k, b)| (k, b.into())).collect()
}

impl CalibrationRun {
    pub fn from_tally(policy: &TierPolicy, tally: Tally, outcome: &OutcomeModel, seed: u64) -> Self {
        let accuracy = tally.overall.accuracy();
        let issue_rate = if tally.iterations > 0 {
            tally.overall.signals as f64 / tally.iterations as f64 * 100.0
        } else {
            0.0
        };
        Self {
            tier: policy.name().to_string(),
            policy_version: policy.version(),
            policy_fingerprint: policy.fingerprint(),
            iterations: tally.iterations,
            total_signals: tally.overall.signals,
            holds: tally.holds,
            correct: tally.overall.correct,
            accuracy,
            issue_rate,
            target_range: policy.target_accuracy_range(),
            target_achieved: accuracy.is_some_and(|a| policy.accepts_accuracy(a)),
            breakdown_by_direction: stats(tally.by_direction),
            breakdown_by_scenario: stats(tally.by_scenario),
            breakdown_by_confidence: stats(tally.by_confidence),
            outcome_model: outcome.describe(),
            seed,
        }
    }
}

// ─── Monte Carlo ─────────────────────────────────────────────────────

/// Run the calibration Monte Carlo for one tier.
pub fn run_calibration(
    policy: &TierPolicy,
    config: &CalibrationConfig,
) -> Result<CalibrationRun, CalibrationError> {
    if config.iterations == 0 {
        return Err(CalibrationError::ZeroIterations);
    }
    if config.scenarios.is_empty() {
        return Err(CalibrationError::NoScenarios);
    }
    if config.instruments.is_empty() {
        return Err(CalibrationError::NoInstruments);
    }
    config.validate()?;

    let span = tracing::info_span!("calibration", tier = policy.name(), seed = config.seed);
    let _guard = span.enter();
    tracing::info!(
        iterations = config.iterations,
        parallel = config.parallel,
        outcome = %config.outcome.describe(),
        "starting calibration"
    );

    let scorer = ConfluenceScorer::with_settings(policy.clone(), config.indicators.clone());
    let hierarchy = RngHierarchy::new(config.seed);
    let outcome_stream = format!("outcome/{}", policy.name());
    let iterations = config.iterations as u64;

    let run_one = |i: u64| run_iteration(&scorer, config, &hierarchy, &outcome_stream, i);

    let tally = if config.parallel {
        (0..iterations)
            .into_par_iter()
            .map(run_one)
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?
    } else {
        (0..iterations)
            .map(run_one)
            .try_fold(Tally::default(), |acc, t| t.map(|t| acc.merge(t)))?
    };

    let run = CalibrationRun::from_tally(policy, tally, &config.outcome, config.seed);
    tracing::info!(
        signals = run.total_signals,
        holds = run.holds,
        accuracy = ?run.accuracy,
        target_achieved = run.target_achieved,
        "calibration finished"
    );
    Ok(run)
}

/// Calibrate several tiers against the same configuration.
pub fn run_calibrations<'a, I>(
    policies: I,
    config: &CalibrationConfig,
) -> Result<Vec<CalibrationRun>, CalibrationError>
where
    I: IntoIterator<Item = &'a TierPolicy>,
{
    policies
        .into_iter()
        .map(|policy| run_calibration(policy, config))
        .collect()
}

fn run_iteration(
    scorer: &ConfluenceScorer,
    config: &CalibrationConfig,
    hierarchy: &RngHierarchy,
    outcome_stream: &str,
    iteration: u64,
) -> Result<Tally, CalibrationError> {
    let mut path_rng = hierarchy.rng_for("path", iteration);
    let scenario = config.scenarios[path_rng.gen_range(0..config.scenarios.len())];
    let instrument = &config.instruments[path_rng.gen_range(0..config.instruments.len())];

    let lookahead = config.outcome.lookahead();
    let path = generate_path(
        instrument,
        scenario,
        config.history_len + lookahead,
        &mut path_rng,
    )?;
    let window = path.prefix(config.history_len);
    let signal = scorer.score(&window)?;

    tracing::trace!(
        iteration,
        scenario = scenario.name(),
        instrument = %instrument.name,
        direction = %signal.direction,
        confidence = signal.confidence,
        "scored"
    );

    if !signal.is_actionable() {
        return Ok(Tally::hold());
    }

    let correct = judge(
        &config.outcome,
        &path,
        config.history_len,
        signal.direction,
        signal.confidence,
        || hierarchy.rng_for(outcome_stream, iteration),
    );
    Ok(Tally::signal(
        signal.direction,
        scenario.name(),
        signal.confidence,
        correct,
    ))
}

/// Decide one actionable signal scored on the first `scored_len` bars of `path`.
pub(crate) fn judge<F>(
    outcome: &OutcomeModel,
    path: &PriceSeries,
    scored_len: usize,
    direction: Direction,
    confidence: f64,
    outcome_rng: F,
) -> bool
where
    F: FnOnce() -> rand::rngs::StdRng,
{
    match *outcome {
        OutcomeModel::Simulated { mapping } => mapping.draw(confidence, &mut outcome_rng()),
        OutcomeModel::Realized { horizon } => {
            let Some(last) = scored_len.checked_sub(1) else {
                return false;
            };
            let bars = path.bars();
            match (bars.get(last), bars.get(last + horizon)) {
                (Some(entry), Some(future)) => {
                    realized_outcome(direction, entry.close, future.close).unwrap_or(false)
                }
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluence_core::policy::Tier;

    use crate::outcome::ProbabilityMapping;
    use crate::scenario::Scenario;

    fn small_config() -> CalibrationConfig {
        CalibrationConfig {
            iterations: 200,
            seed: 7,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn bucket_accuracy() {
        let b = Bucket {
            signals: 4,
            correct: 3,
        };
        assert_eq!(b.accuracy(), Some(75.0));
        assert_eq!(Bucket::default().accuracy(), None);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence_band(62.0), "60-70");
        assert_eq!(confidence_band(70.0), "70-80");
        assert_eq!(confidence_band(100.0), "90-100");
        assert_eq!(confidence_band(3.0), "0-10");
    }

    #[test]
    fn tally_merge_is_order_independent() {
        let a = Tally::signal(Direction::Buy, "normal", 65.0, true);
        let b = Tally::signal(Direction::Sell, "bearish", 75.0, false);
        let c = Tally::hold();
        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = c.merge(b.merge(a));
        assert_eq!(left, right);
        assert_eq!(left.iterations, 3);
        assert_eq!(left.holds, 1);
        assert_eq!(left.overall, Bucket { signals: 2, correct: 1 });
    }

    #[test]
    fn same_seed_same_report() {
        let policy = Tier::Conservative.policy();
        let a = run_calibration(&policy, &small_config()).unwrap();
        let b = run_calibration(&policy, &small_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential() {
        let policy = Tier::Balanced.policy();
        let parallel = run_calibration(&policy, &small_config()).unwrap();
        let sequential = run_calibration(
            &policy,
            &CalibrationConfig {
                parallel: false,
                ..small_config()
            },
        )
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn counts_add_up() {
        let run = run_calibration(&Tier::Conservative.policy(), &small_config()).unwrap();
        assert_eq!(run.iterations, 200);
        assert_eq!(run.total_signals + run.holds, run.iterations);
        let by_dir: usize = run.breakdown_by_direction.values().map(|b| b.signals).sum();
        let by_band: usize = run.breakdown_by_confidence.values().map(|b| b.signals).sum();
        let by_scenario: usize = run.breakdown_by_scenario.values().map(|b| b.signals).sum();
        assert_eq!(by_dir, run.total_signals);
        assert_eq!(by_band, run.total_signals);
        assert_eq!(by_scenario, run.total_signals);
        assert!(!run.breakdown_by_direction.contains_key(&Direction::Hold));
    }

    #[test]
    fn target_achieved_matches_band() {
        let policy = Tier::Balanced.policy();
        let run = run_calibration(&policy, &small_config()).unwrap();
        let expected = run
            .accuracy
            .map(|a| (55.0..=65.0).contains(&a))
            .unwrap_or(false);
        assert_eq!(run.target_achieved, expected);
    }

    #[test]
    fn zero_signals_reports_no_accuracy() {
        // Five-bar windows leave every indicator at its neutral default.
        let config = CalibrationConfig {
            iterations: 20,
            history_len: 5,
            ..CalibrationConfig::default()
        };
        let run = run_calibration(&Tier::Aggressive.policy(), &config).unwrap();
        assert_eq!(run.total_signals, 0);
        assert_eq!(run.accuracy, None);
        assert!(!run.target_achieved);
        assert_eq!(run.issue_rate, 0.0);
    }

    #[test]
    fn always_right_mapping_scores_hundred() {
        let config = CalibrationConfig {
            outcome: OutcomeModel::Simulated {
                mapping: ProbabilityMapping::Linear {
                    pivot: 50.0,
                    slope: 0.0,
                    floor: 1.0,
                    ceiling: 1.0,
                },
            },
            ..small_config()
        };
        let run = run_calibration(&Tier::Conservative.policy(), &config).unwrap();
        assert!(run.total_signals > 0);
        assert_eq!(run.accuracy, Some(100.0));
        assert!(!run.target_achieved);
    }

    #[test]
    fn realized_outcomes_run() {
        let config = CalibrationConfig {
            outcome: OutcomeModel::Realized { horizon: 5 },
            scenarios: vec![Scenario::Trending],
            ..small_config()
        };
        let run = run_calibration(&Tier::Conservative.policy(), &config).unwrap();
        assert_eq!(run.total_signals + run.holds, 200);
        assert!(run.outcome_model.starts_with("realized"));
    }

    #[test]
    fn tiers_see_the_same_paths() {
        // Identical policies under different names only differ in outcome draws,
        // never in which bars get scored.
        let mut def = Tier::Balanced.definition();
        def.name = "balanced-copy".into();
        let copy = TierPolicy::try_from(def).unwrap();
        let a = run_calibration(&Tier::Balanced.policy(), &small_config()).unwrap();
        let b = run_calibration(&copy, &small_config()).unwrap();
        assert_eq!(a.total_signals, b.total_signals);
        assert_eq!(a.breakdown_by_direction.len(), b.breakdown_by_direction.len());
    }

    #[test]
    fn empty_scenarios_rejected() {
        let config = CalibrationConfig {
            scenarios: Vec::new(),
            ..small_config()
        };
        assert!(matches!(
            run_calibration(&Tier::Balanced.policy(), &config),
            Err(CalibrationError::NoScenarios)
        ));
    }
}
