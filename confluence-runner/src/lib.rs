//! Confluence Runner: calibration and validation of scoring tiers.
//!
//! This crate builds on `confluence-core` to provide:
//! - Synthetic scenario paths over configurable instrument profiles
//! - Declared confidence → probability mappings and realized outcomes
//! - Parallel, seed-deterministic calibration Monte Carlo
//! - Walk-forward replay over loaded history
//! - CSV bar loading and TOML run configuration
//! - Text, JSON and CSV reports

pub mod calibration;
pub mod config;
pub mod data_loader;
pub mod outcome;
pub mod replay;
pub mod report;
pub mod scenario;

pub use calibration::{
    confidence_band, run_calibration, run_calibrations, BucketStats, CalibrationError,
    CalibrationRun, Tally, HISTORICAL,
};
pub use config::{CalibrationConfig, ConfigError};
pub use data_loader::{load_csv, read_csv, LoadError};
pub use outcome::{realized_outcome, OutcomeModel, ProbabilityMapping};
pub use replay::{run_replay, ReplayConfig};
pub use report::{
    render_breakdown, render_summary, write_confidence_csv, write_json, CalibrationReport,
};
pub use scenario::{generate_path, InstrumentProfile, Scenario, ScenarioError};
