//! Report rendering: plain-text tables, JSON and CSV.
//!
//! The JSON document wraps the runs with a `schema_version`; unknown versions
//! are rejected on load.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::calibration::{BucketStats, CalibrationRun};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub schema_version: u32,
    pub runs: Vec<CalibrationRun>,
}

impl CalibrationReport {
    pub fn new(runs: Vec<CalibrationRun>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            runs,
        }
    }
}

// ─── Text ───────────────────────────────────────────────────────────

fn fmt_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(a) => format!("{a:.1}%"),
        None => "n/a".to_string(),
    }
}

/// One row per tier: target band, signal counts, accuracy, achieved flag.
pub fn render_summary(runs: &[CalibrationRun]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>11} {:>8} {:>8} {:>8} {:>9} {:>9}",
        "TIER", "TARGET", "SIGNALS", "HOLDS", "ISSUED", "ACCURACY", "ACHIEVED"
    );
    for run in runs {
        let (lo, hi) = run.target_range;
        let _ = writeln!(
            out,
            "{:<14} {:>11} {:>8} {:>8} {:>8} {:>9} {:>9}",
            run.tier,
            format!("{lo:.0}-{hi:.0}%"),
            run.total_signals,
            run.holds,
            format!("{:.1}%", run.issue_rate),
            fmt_accuracy(run.accuracy),
            if run.target_achieved { "yes" } else { "no" },
        );
    }
    out
}

fn render_buckets<'a, I>(out: &mut String, title: &str, buckets: I)
where
    I: IntoIterator<Item = (String, &'a BucketStats)>,
{
    let _ = writeln!(out, "  {title}:");
    let mut any = false;
    for (label, stats) in buckets {
        any = true;
        let _ = writeln!(
            out,
            "    {:<12} {:>7} signals {:>7} correct {:>8}",
            label,
            stats.signals,
            stats.correct,
            fmt_accuracy(stats.accuracy),
        );
    }
    if !any {
        let _ = writeln!(out, "    (none)");
    }
}

/// Per-direction, per-scenario and per-confidence-band detail for one run.
pub fn render_breakdown(run: &CalibrationRun) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} v{} [{}]",
        run.tier,
        run.policy_version,
        run.policy_fingerprint
            .get(..12)
            .unwrap_or(run.policy_fingerprint.as_str())
    );
    let _ = writeln!(
        out,
        "  iterations {}  seed {}  outcome {}",
        run.iterations, run.seed, run.outcome_model
    );
    render_buckets(
        &mut out,
        "by direction",
        run.breakdown_by_direction
            .iter()
            .map(|(d, s)| (d.to_string(), s)),
    );
    render_buckets(
        &mut out,
        "by scenario",
        run.breakdown_by_scenario.iter().map(|(k, s)| (k.clone(), s)),
    );
    render_buckets(
        &mut out,
        "by confidence",
        run.breakdown_by_confidence
            .iter()
            .map(|(k, s)| (k.clone(), s)),
    );
    out
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn to_json(runs: &[CalibrationRun]) -> Result<String> {
    let report = CalibrationReport::new(runs.to_vec());
    serde_json::to_string_pretty(&report).context("failed to serialize calibration report")
}

pub fn from_json(json: &str) -> Result<CalibrationReport> {
    let report: CalibrationReport =
        serde_json::from_str(json).context("failed to deserialize calibration report")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

pub fn write_json(path: &Path, runs: &[CalibrationRun]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = to_json(runs)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), runs = runs.len(), "wrote report");
    Ok(())
}

// ─── CSV ────────────────────────────────────────────────────────────

/// The calibration curve: one row per (tier, confidence band).
///
/// Columns: tier, band, signals, correct, accuracy
pub fn export_confidence_csv(runs: &[CalibrationRun]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["tier", "band", "signals", "correct", "accuracy"])?;
    for run in runs {
        for (band, stats) in &run.breakdown_by_confidence {
            wtr.write_record([
                run.tier.as_str(),
                band.as_str(),
                &stats.signals.to_string(),
                &stats.correct.to_string(),
                &stats
                    .accuracy
                    .map(|a| format!("{a:.2}"))
                    .unwrap_or_default(),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn write_confidence_csv(path: &Path, runs: &[CalibrationRun]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let csv = export_confidence_csv(runs)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), runs = runs.len(), "wrote calibration curve");
    Ok(())
}
