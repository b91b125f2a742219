//! Confluence CLI: tier listing, one-off scoring, calibration and replay.
//!
//! Commands:
//! - `tiers`: list the built-in (and optionally file-declared) tier policies
//! - `score`: score the latest bar of a CSV history and print the signal as JSON
//! - `calibrate`: run the calibration Monte Carlo and print the summary table
//! - `replay`: walk-forward scoring over a CSV history with realized outcomes
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use confluence_core::policy::{TierPolicy, TierRegistry};
use confluence_core::scoring::{ConfluenceScorer, Scorer};
use confluence_runner::report::{
    render_breakdown, render_summary, write_confidence_csv, write_json,
};
use confluence_runner::{
    load_csv, run_calibrations, run_replay, CalibrationConfig, CalibrationRun, OutcomeModel,
    ReplayConfig,
};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence scoring engine and calibration harness"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tier policies.
    Tiers {
        /// TOML file with extra or overriding [[tier]] tables.
        #[arg(long)]
        tiers_file: Option<PathBuf>,
    },
    /// Score the most recent bar of a CSV history.
    Score {
        /// CSV with timestamp,open,high,low,close,volume columns.
        #[arg(long)]
        csv: PathBuf,

        /// Instrument name recorded in the result.
        #[arg(long)]
        instrument: String,

        /// Tier name or alias.
        #[arg(long, default_value = "balanced")]
        tier: String,

        #[arg(long)]
        tiers_file: Option<PathBuf>,

        /// Instrument-specific baseline for the volume ratio.
        #[arg(long)]
        baseline_volume: Option<f64>,
    },
    /// Run the calibration Monte Carlo over synthetic scenarios.
    Calibrate {
        /// Tier name, alias, or `all`.
        #[arg(long, default_value = "all")]
        tier: String,

        #[arg(long)]
        iterations: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Calibration TOML config. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        tiers_file: Option<PathBuf>,

        /// Judge signals on the path itself, H bars ahead.
        #[arg(long)]
        realized_horizon: Option<usize>,

        /// Run iterations on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Print per-direction, per-scenario and per-band detail.
        #[arg(long, default_value_t = false)]
        breakdown: bool,

        /// Write the full report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the per-band calibration curve as CSV.
        #[arg(long)]
        curve_csv: Option<PathBuf>,
    },
    /// Walk-forward replay over a CSV history.
    Replay {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long)]
        instrument: String,

        /// Tier name, alias, or `all`.
        #[arg(long, default_value = "all")]
        tier: String,

        #[arg(long)]
        tiers_file: Option<PathBuf>,

        /// Bars in the first scored window.
        #[arg(long, default_value_t = 50)]
        warmup: usize,

        /// Bars between scored windows.
        #[arg(long, default_value_t = 1)]
        step: usize,

        /// Bars ahead used to judge each signal.
        #[arg(long, default_value_t = 5)]
        horizon: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = false)]
        breakdown: bool,

        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        curve_csv: Option<PathBuf>,
    },
}

/// Where a calibration or replay run sends its results besides the summary.
struct Outputs {
    breakdown: bool,
    json: Option<PathBuf>,
    curve_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tiers { tiers_file } => run_tiers(tiers_file.as_deref()),
        Commands::Score {
            csv,
            instrument,
            tier,
            tiers_file,
            baseline_volume,
        } => run_score(&csv, &instrument, &tier, tiers_file.as_deref(), baseline_volume),
        Commands::Calibrate {
            tier,
            iterations,
            seed,
            config,
            tiers_file,
            realized_horizon,
            sequential,
            breakdown,
            output,
            curve_csv,
        } => {
            let mut cfg = match config {
                Some(path) => CalibrationConfig::from_file(&path)?,
                None => CalibrationConfig::default(),
            };
            if let Some(n) = iterations {
                cfg.iterations = n;
            }
            if let Some(s) = seed {
                cfg.seed = s;
            }
            if let Some(horizon) = realized_horizon {
                cfg.outcome = OutcomeModel::Realized { horizon };
            }
            if sequential {
                cfg.parallel = false;
            }
            cfg.validate()?;
            let outputs = Outputs {
                breakdown,
                json: output,
                curve_csv,
            };
            run_calibrate(&tier, tiers_file.as_deref(), &cfg, &outputs)
        }
        Commands::Replay {
            csv,
            instrument,
            tier,
            tiers_file,
            warmup,
            step,
            horizon,
            seed,
            breakdown,
            output,
            curve_csv,
        } => {
            let cfg = ReplayConfig {
                warmup,
                step,
                outcome: OutcomeModel::Realized { horizon },
                seed,
                ..ReplayConfig::default()
            };
            let outputs = Outputs {
                breakdown,
                json: output,
                curve_csv,
            };
            run_replay_cmd(&csv, &instrument, &tier, tiers_file.as_deref(), &cfg, &outputs)
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(tiers_file: Option<&Path>) -> Result<TierRegistry> {
    let registry = match tiers_file {
        Some(path) => TierRegistry::from_toml_file(path)
            .with_context(|| format!("failed to load tiers from {}", path.display()))?,
        None => TierRegistry::builtin(),
    };
    Ok(registry)
}

fn select_policies<'a>(registry: &'a TierRegistry, tier: &str) -> Result<Vec<&'a TierPolicy>> {
    if tier.eq_ignore_ascii_case("all") {
        return Ok(registry.iter().collect());
    }
    Ok(vec![registry.get(tier)?])
}

fn run_tiers(tiers_file: Option<&Path>) -> Result<()> {
    let registry = load_registry(tiers_file)?;
    println!(
        "{:<14} {:>3} {:>9} {:>10} {:>8} {:>10}",
        "TIER", "VER", "THRESHOLD", "BOUNDS", "FACTORS", "TARGET"
    );
    println!("{}", "-".repeat(59));
    for policy in registry.iter() {
        let (lo, hi) = policy.confidence_bounds();
        let (t_lo, t_hi) = policy.target_accuracy_range();
        println!(
            "{:<14} {:>3} {:>9.1} {:>10} {:>8} {:>10}",
            policy.name(),
            policy.version(),
            policy.confidence_threshold(),
            format!("{lo:.0}-{hi:.0}"),
            policy.min_confluent_factors(),
            format!("{t_lo:.0}-{t_hi:.0}%"),
        );
    }
    Ok(())
}

fn run_score(
    csv: &Path,
    instrument: &str,
    tier: &str,
    tiers_file: Option<&Path>,
    baseline_volume: Option<f64>,
) -> Result<()> {
    let registry = load_registry(tiers_file)?;
    let policy = registry.get(tier)?;

    let mut series = load_csv(csv, instrument)?;
    if let Some(baseline) = baseline_volume {
        series = series.with_baseline_volume(baseline)?;
    }

    let scorer = ConfluenceScorer::new(policy.clone());
    let signal = scorer.score(&series)?;
    tracing::info!(
        instrument,
        tier = policy.name(),
        bars = series.len(),
        direction = %signal.direction,
        confidence = signal.confidence,
        "scored latest bar"
    );
    println!("{}", serde_json::to_string_pretty(&signal)?);
    Ok(())
}

fn run_calibrate(
    tier: &str,
    tiers_file: Option<&Path>,
    config: &CalibrationConfig,
    outputs: &Outputs,
) -> Result<()> {
    let registry = load_registry(tiers_file)?;
    let policies = select_policies(&registry, tier)?;
    tracing::info!(
        tiers = policies.len(),
        iterations = config.iterations,
        seed = config.seed,
        "starting calibration"
    );
    let runs = run_calibrations(policies, config)?;
    tracing::info!(runs = runs.len(), "calibration finished");
    emit_runs(&runs, outputs)
}

fn run_replay_cmd(
    csv: &Path,
    instrument: &str,
    tier: &str,
    tiers_file: Option<&Path>,
    config: &ReplayConfig,
    outputs: &Outputs,
) -> Result<()> {
    let registry = load_registry(tiers_file)?;
    let policies = select_policies(&registry, tier)?;
    let series = load_csv(csv, instrument)?;
    if series.len() < config.warmup {
        bail!(
            "{} has {} bars, fewer than the {}-bar warmup",
            csv.display(),
            series.len(),
            config.warmup
        );
    }

    tracing::info!(
        instrument,
        bars = series.len(),
        tiers = policies.len(),
        warmup = config.warmup,
        step = config.step,
        "starting replay"
    );
    let runs = policies
        .into_iter()
        .map(|policy| run_replay(policy, &series, config))
        .collect::<Result<Vec<CalibrationRun>, _>>()?;
    tracing::info!(runs = runs.len(), "replay finished");
    emit_runs(&runs, outputs)
}

fn emit_runs(runs: &[CalibrationRun], outputs: &Outputs) -> Result<()> {
    print!("{}", render_summary(runs));
    if outputs.breakdown {
        for run in runs {
            println!();
            print!("{}", render_breakdown(run));
        }
    }
    if let Some(path) = &outputs.json {
        write_json(path, runs)?;
    }
    if let Some(path) = &outputs.curve_csv {
        write_confidence_csv(path, runs)?;
    }
    Ok(())
}
