//! Historical replay: walk-forward scoring over a loaded series.
//!
//! For each end index `e` in `warmup, warmup + step, ...` the scorer sees
//! only `bars[..e]` (a shared-buffer prefix, so nothing past `e - 1` is
//! visible). Issued signals are judged by the configured outcome model; a
//! realized judgement needs `horizon` further bars, so the walk stops early
//! enough to have them. Every step is tallied under the `historical` label.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use confluence_core::domain::PriceSeries;
use confluence_core::policy::TierPolicy;
use confluence_core::rng::RngHierarchy;
use confluence_core::scoring::{ConfluenceScorer, Scorer};
use confluence_core::snapshot::IndicatorSettings;

use crate::calibration::{judge, CalibrationError, CalibrationRun, Tally, HISTORICAL};
use crate::outcome::OutcomeModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bars in the first scored window.
    pub warmup: usize,
    /// Bars between consecutive scored windows.
    pub step: usize,
    pub outcome: OutcomeModel,
    /// Seed for simulated outcome draws.
    pub seed: u64,
    pub indicators: IndicatorSettings,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            warmup: 50,
            step: 1,
            outcome: OutcomeModel::Realized { horizon: 5 },
            seed: 42,
            indicators: IndicatorSettings::default(),
        }
    }
}

/// Replay `series` through `policy`.
pub fn run_replay(
    policy: &TierPolicy,
    series: &PriceSeries,
    config: &ReplayConfig,
) -> Result<CalibrationRun, CalibrationError> {
    if config.warmup == 0 {
        return Err(CalibrationError::InvalidReplay("warmup must be at least 1".into()));
    }
    if config.step == 0 {
        return Err(CalibrationError::InvalidReplay("step must be at least 1".into()));
    }
    if let OutcomeModel::Realized { horizon: 0 } = config.outcome {
        return Err(CalibrationError::InvalidReplay(
            "realized horizon must be at least 1".into(),
        ));
    }

    let lookahead = config.outcome.lookahead();
    let required = config.warmup + lookahead;
    if series.len() < required {
        return Err(CalibrationError::InsufficientReplayHistory {
            bars: series.len(),
            required,
        });
    }

    let span = tracing::info_span!(
        "replay",
        tier = policy.name(),
        instrument = series.instrument()
    );
    let _guard = span.enter();

    let ends: Vec<usize> = (config.warmup..=series.len() - lookahead)
        .step_by(config.step)
        .collect();
    tracing::info!(bars = series.len(), windows = ends.len(), "starting replay");

    let scorer = ConfluenceScorer::with_settings(policy.clone(), config.indicators.clone());
    let hierarchy = RngHierarchy::new(config.seed);
    let outcome_stream = format!("replay/{}", policy.name());

    let tally = ends
        .par_iter()
        .map(|&end| -> Result<Tally, CalibrationError> {
            let window = series.prefix(end);
            let signal = scorer.score(&window)?;
            if !signal.is_actionable() {
                return Ok(Tally::hold());
            }
            let correct = judge(
                &config.outcome,
                series,
                end,
                signal.direction,
                signal.confidence,
                || hierarchy.rng_for(&outcome_stream, end as u64),
            );
            Ok(Tally::signal(
                signal.direction,
                HISTORICAL,
                signal.confidence,
                correct,
            ))
        })
        .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?;

    let run = CalibrationRun::from_tally(policy, tally, &config.outcome, config.seed);
    tracing::info!(
        signals = run.total_signals,
        accuracy = ?run.accuracy,
        target_achieved = run.target_achieved,
        "replay finished"
    );
    Ok(run)
}
