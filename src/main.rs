//! misp-bench: benchmark harness for anytime MISP solvers.
//!
//! Runs a size × density × replica sweep over external solver binaries,
//! persists idempotent run/summary tables, and aligns anytime progress logs
//! for head-to-head comparison.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use misp_bench::runtime::config::SweepFile;
use misp_bench::runtime::runner::{Runner, SweepOutcome};
use misp_bench::runtime::telemetry::init_tracing;
use misp_bench::trace::align::{ReferenceGrid, TraceAligner};
use misp_bench::trace::anytime::AnytimeTrace;
use misp_bench::{aggregate, report, GroupBy, Observation, RunRegistry};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "misp-bench", version, about = "Benchmark harness for anytime MISP solvers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full experiment matrix described by a sweep config file.
    Sweep {
        /// YAML sweep configuration.
        #[arg(long)]
        config: PathBuf,
        /// Override the configured output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Override the configured worker pool size.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Aggregate a persisted run table into a per-density summary table.
    Summarize {
        /// Run table produced by a sweep (`DENSITY,INSTANCE,VALOR[,TIEMPO]`).
        #[arg(long)]
        runs: PathBuf,
        /// Output summary table (`DENSITY,MEDIA_CALIDAD,STD_CALIDAD`).
        #[arg(long)]
        out: PathBuf,
        /// The run table carries the optional TIEMPO column.
        #[arg(long)]
        with_elapsed: bool,
    },
    /// Align anytime progress logs onto a common grid and export the
    /// comparison table.
    Versus {
        /// Output comparison table.
        #[arg(long)]
        out: PathBuf,
        /// Traces as NAME=FILE pairs, in ranking-priority order.
        #[arg(value_name = "NAME=FILE", required = true)]
        traces: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = format!("{err:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Sweep {
            config,
            output_dir,
            workers,
        } => sweep(config, output_dir, workers).await,
        Commands::Summarize {
            runs,
            out,
            with_elapsed,
        } => summarize(runs, out, with_elapsed),
        Commands::Versus { out, traces } => versus(out, traces),
    }
}

async fn sweep(
    config_path: PathBuf,
    output_dir: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<ExitCode> {
    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read sweep config {}", config_path.display()))?;
    let mut file: SweepFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse sweep config {}", config_path.display()))?;
    if let Some(dir) = output_dir {
        file.output_dir = dir;
    }
    if let Some(workers) = workers {
        file.workers = Some(workers);
    }
    let config = file.into_config()?;

    let runner = Runner::new(config);
    let outcome = runner.run_until_ctrl_c().await?;
    Ok(match outcome {
        SweepOutcome::Completed => ExitCode::SUCCESS,
        // distinct from a crash: the sweep ran, but nothing succeeded
        SweepOutcome::NoUsableData => ExitCode::from(2),
        SweepOutcome::Cancelled => ExitCode::from(130),
    })
}

fn summarize(runs: PathBuf, out: PathBuf, with_elapsed: bool) -> Result<ExitCode> {
    let rows = RunRegistry::load(&runs, with_elapsed)?;
    let observations: Vec<Observation> = rows
        .iter()
        .map(|row| Observation {
            algorithm: String::new(),
            size: None,
            density: row.density.clone(),
            value: row.value,
        })
        .collect();
    let summaries = aggregate::summarize(&observations, GroupBy::DENSITY);
    report::write_summaries(&out, &summaries)?;
    tracing::info!(
        rows = rows.len(),
        groups = summaries.len(),
        out = %out.display(),
        "summary table written"
    );
    Ok(ExitCode::SUCCESS)
}

fn versus(out: PathBuf, trace_args: Vec<String>) -> Result<ExitCode> {
    let mut traces = Vec::new();
    for arg in &trace_args {
        let Some((name, path)) = arg.split_once('=') else {
            bail!("trace argument {arg:?} is not of the form NAME=FILE");
        };
        let trace = AnytimeTrace::from_file(std::path::Path::new(path))?;
        if trace.is_empty() {
            tracing::warn!(algorithm = name, path, "anytime log contributed no samples");
        } else {
            tracing::info!(
                algorithm = name,
                samples = trace.len(),
                best = trace.best().unwrap_or_default(),
                last = trace.last().map(|s| s.value).unwrap_or_default(),
                "anytime log loaded"
            );
        }
        traces.push((name.to_string(), trace));
    }

    let grid = TraceAligner::new(ReferenceGrid::Densest).align(&traces);
    if let Some(reference) = grid.reference() {
        tracing::info!(reference, points = grid.times().len(), "reference grid chosen");
    }
    report::write_comparison(&out, &grid)?;

    // final ranking by last recorded value, declared order breaking ties
    let mut ranking: Vec<(&str, i64)> = traces
        .iter()
        .filter_map(|(name, trace)| trace.last().map(|s| (name.as_str(), s.value)))
        .collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    for (position, (name, value)) in ranking.iter().enumerate() {
        tracing::info!(rank = position + 1, algorithm = name, value, "versus ranking");
    }

    if grid.times().is_empty() {
        tracing::warn!("no trace contributed samples; comparison table contains headers only");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
