//! Confluence Core: indicators, tier policies and the confluence scorer.
//!
//! This crate contains the scoring engine:
//! - Domain types (bars, price series, signal results)
//! - Stateless indicator library with documented short-history defaults
//! - Per-call indicator snapshot
//! - Validated, versioned tier policies and a TOML-extensible registry
//! - One confluence scorer parameterized by the tier policy
//! - Deterministic RNG hierarchy shared with the calibration harness

pub mod domain;
pub mod indicators;
pub mod policy;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use domain::{Bar, Direction, PriceSeries, SignalResult};
pub use policy::{Tier, TierPolicy, TierRegistry};
pub use scoring::{ConfluenceScorer, FactorTag, Scorer};
pub use snapshot::{IndicatorSettings, IndicatorSnapshot};
