use crate::aggregate::{self, GroupBy, Observation};
use crate::report;
use crate::runtime::config::SweepConfig;
use crate::runtime::sweep::Sweep;
use crate::runtime::telemetry::{spawn_metrics_reporter, Telemetry, DEFAULT_METRICS_INTERVAL};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// How a completed sweep ended. `NoUsableData` is not a crash: the tables
/// were written (header-only) and the operator is warned, but the exit
/// status must be distinguishable from both success and failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    NoUsableData,
    Cancelled,
}

/// Coordinates the sweep lifecycle: root cancellation token, Ctrl-C
/// handling, metrics reporting, and final table export.
pub struct Runner {
    config: Arc<SweepConfig>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
}

impl Runner {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config: Arc::new(config),
            telemetry: Arc::new(Telemetry::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate their own cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Runs the sweep to completion (or cancellation) and writes the final
    /// run and summary tables. Tables are always written, possibly with only
    /// a header row, so downstream tooling never reads an absent file.
    pub async fn run(&self) -> Result<SweepOutcome> {
        std::fs::create_dir_all(self.config.output_dir()).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.config.output_dir().display()
            )
        })?;

        let reporter_shutdown = self.shutdown.child_token();
        let reporter = spawn_metrics_reporter(
            self.telemetry.clone(),
            reporter_shutdown.clone(),
            DEFAULT_METRICS_INTERVAL,
        );

        let sweep = Sweep::new(
            self.config.clone(),
            self.telemetry.clone(),
            self.shutdown.clone(),
        );
        let sizes = sweep.run().await?;

        for size_registries in &sizes {
            let size = size_registries.size;
            let mut ranking_observations = Vec::new();
            for (name, registry) in &size_registries.per_algorithm {
                registry
                    .flush(&sweep.run_table_path(size, name))
                    .with_context(|| format!("failed to write run table for {name}"))?;

                let observations: Vec<Observation> = registry
                    .results()
                    .iter()
                    .filter_map(Observation::from_result)
                    .collect();
                let summaries = aggregate::summarize(&observations, GroupBy::DENSITY);
                report::write_summaries(&sweep.summary_table_path(size, name), &summaries)
                    .with_context(|| format!("failed to write summary table for {name}"))?;
                ranking_observations.extend(observations);
            }

            let summaries = aggregate::summarize(&ranking_observations, GroupBy::ALGORITHM_SIZE);
            for (position, summary) in aggregate::rank(&summaries) {
                tracing::info!(
                    size,
                    rank = position,
                    algorithm = summary.algorithm.as_deref().unwrap_or("?"),
                    mean = format!("{:.2}", summary.mean),
                    n = summary.n,
                    "final ranking"
                );
            }
        }

        reporter_shutdown.cancel();
        let _ = reporter.await;

        let snapshot = self.telemetry.snapshot();
        tracing::info!(
            dispatched = snapshot.dispatched,
            successes = snapshot.successes,
            timeouts = snapshot.timeouts,
            failures = snapshot.failures,
            missing_inputs = snapshot.missing_inputs,
            "sweep finished"
        );

        if self.shutdown.is_cancelled() {
            return Ok(SweepOutcome::Cancelled);
        }
        if snapshot.successes == 0 {
            tracing::warn!("sweep produced no successful runs; tables contain headers only");
            return Ok(SweepOutcome::NoUsableData);
        }
        Ok(SweepOutcome::Completed)
    }

    /// Runs the sweep while listening for Ctrl-C (SIGINT). On the first
    /// signal no new runs are dispatched; in-flight runs finish or hit their
    /// own timeout, and everything recorded so far is still flushed.
    pub async fn run_until_ctrl_c(&self) -> Result<SweepOutcome> {
        let shutdown = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received; stopping dispatch of new runs");
                shutdown.cancel();
            }
        });

        let outcome = self.run().await;
        signal_task.abort();
        outcome
    }
}
