//! Signal output types.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::scoring::FactorTag;
use crate::snapshot::IndicatorSnapshot;

/// Neutral confidence reported for every HOLD.
pub const HOLD_CONFIDENCE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Hold => "HOLD",
        }
    }

    pub fn is_actionable(self) -> bool {
        !matches!(self, Direction::Hold)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scorer's verdict for one series under one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub instrument: String,
    pub tier: String,
    /// Timestamp of the bar the signal was computed at.
    pub as_of: Option<NaiveDateTime>,
    pub direction: Direction,
    /// Percentage in [0, 100]. Exactly 50 for HOLD.
    pub confidence: f64,
    /// Every factor evaluated, in evaluation order.
    pub contributing_factors: Vec<FactorTag>,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub indicator_snapshot: IndicatorSnapshot,
}

impl SignalResult {
    pub fn is_actionable(&self) -> bool {
        self.direction.is_actionable()
    }
}
