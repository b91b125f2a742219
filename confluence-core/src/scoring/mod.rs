//! Confluence scoring: turns a price series into a directional signal.
//!
//! The scorer is stateless: the tier policy is a parameter, the snapshot is
//! recomputed per call, and concurrent calls on one scorer never interact.

pub mod confluence;
pub mod factors;

use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError, SignalResult};
use crate::policy::TierPolicy;

pub use confluence::{resolve_direction, ConfluenceScorer, Evaluation};
pub use factors::{classify, count_bias, Bias, Factor, FactorCategory, FactorTag, Regime};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("cannot score an empty price series")]
    EmptySeries,

    #[error("malformed price series: {0}")]
    Malformed(#[from] SeriesError),
}

/// Trait for signal scorers.
///
/// # Architecture invariant
/// A scorer sees only the series it is handed and its own policy. It never
/// observes outcomes, so calibration cannot feed back into scoring.
pub trait Scorer: Send + Sync {
    /// Score the latest bar of `series`.
    fn score(&self, series: &PriceSeries) -> Result<SignalResult, ScoreError>;

    /// The tier policy this scorer applies.
    fn policy(&self) -> &TierPolicy;
}
