//! Sweep execution: fans RunRequests out over a bounded worker pool and
//! checkpoints run tables after each density group.
//!
//! Every run is an isolated unit of work; results are attributed through the
//! keys they carry, never through completion order. The registry files are
//! the only shared mutable resource and are written by this single task at
//! group checkpoints, never concurrently.

use crate::catalog::InstanceCatalog;
use crate::registry::{RunRegistry, RunRequest, RunResult};
use crate::runtime::config::SweepConfig;
use crate::runtime::telemetry::Telemetry;
use crate::solver::invoker::SolverInvoker;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-algorithm run registries for one graph size.
pub struct SizeRegistries {
    pub size: u32,
    pub per_algorithm: Vec<(String, RunRegistry)>,
}

/// Executes the experiment matrix of one [`SweepConfig`].
pub struct Sweep {
    config: Arc<SweepConfig>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
}

impl Sweep {
    pub fn new(
        config: Arc<SweepConfig>,
        telemetry: Arc<Telemetry>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            telemetry,
            shutdown,
        }
    }

    /// Path of the run table for one (size, algorithm) slice.
    pub fn run_table_path(&self, size: u32, algorithm: &str) -> PathBuf {
        self.config
            .output_dir()
            .join(format!("results{size}_{algorithm}.csv"))
    }

    /// Path of the per-density summary table for one (size, algorithm) slice.
    pub fn summary_table_path(&self, size: u32, algorithm: &str) -> PathBuf {
        self.config
            .output_dir()
            .join(format!("results{size}_{algorithm}_summary.csv"))
    }

    /// Runs the full matrix. Cancellation stops the dispatch of new requests
    /// between groups and within a group; in-flight runs finish or hit their
    /// own timeout, and everything recorded so far stays flushed.
    pub async fn run(&self) -> Result<Vec<SizeRegistries>> {
        let config = &self.config;
        let catalog = InstanceCatalog::enumerate(
            config.dataset_root(),
            config.sizes(),
            config.densities(),
            config.replicas(),
        );
        tracing::info!(
            instances = catalog.instances().len(),
            available = catalog.available_count(),
            algorithms = config.algorithms().len(),
            workers = config.workers(),
            "sweep starting"
        );

        let invoker = SolverInvoker::new(config.grace());
        let mut all_sizes = Vec::new();

        for &size in config.sizes() {
            let mut registries: Vec<(String, RunRegistry)> = config
                .algorithms()
                .iter()
                .map(|spec| (spec.name.clone(), RunRegistry::new(config.record_elapsed())))
                .collect();

            for density in config.densities() {
                if self.shutdown.is_cancelled() {
                    tracing::info!(size, density, "sweep cancelled; skipping remaining groups");
                    break;
                }
                let results = self.run_group(&catalog, &invoker, size, density).await;
                let produced = results.len();
                for result in results {
                    match registries
                        .iter_mut()
                        .find(|(name, _)| *name == result.request.algorithm.name)
                    {
                        Some((_, registry)) => registry.record(result),
                        None => tracing::error!(
                            algorithm = %result.request.algorithm.name,
                            "result for undeclared algorithm; dropping"
                        ),
                    }
                }

                // Checkpoint: rewrite every per-algorithm table for this size.
                for (name, registry) in &registries {
                    registry
                        .flush(&self.run_table_path(size, name))
                        .with_context(|| {
                            format!("failed to checkpoint run table for {name} at size {size}")
                        })?;
                }
                tracing::info!(
                    size,
                    density,
                    results = produced,
                    "density group completed and checkpointed"
                );
            }

            all_sizes.push(SizeRegistries {
                size,
                per_algorithm: registries,
            });
        }

        Ok(all_sizes)
    }

    /// Runs one (size, density) group through the worker pool: one request
    /// per declared algorithm per replica.
    async fn run_group(
        &self,
        catalog: &InstanceCatalog,
        invoker: &SolverInvoker,
        size: u32,
        density: &str,
    ) -> Vec<RunResult> {
        let config = &self.config;
        let mut requests = Vec::new();
        for spec in config.algorithms() {
            let spec = Arc::new(spec.clone());
            for instance in catalog.group(size, density) {
                requests.push(RunRequest {
                    instance: instance.clone(),
                    algorithm: spec.clone(),
                    time_budget: config.time_budget(),
                    seed: config.seed(),
                });
            }
        }

        stream::iter(requests.into_iter().map(|request| {
            let invoker = *invoker;
            let telemetry = self.telemetry.clone();
            let shutdown = self.shutdown.clone();
            async move {
                // Checked at dispatch time: a cancelled sweep issues no new
                // runs, while already-running ones are left to their own
                // timeouts.
                if shutdown.is_cancelled() {
                    return None;
                }
                telemetry.record_dispatched();
                let result = invoker.invoke(request).await;
                telemetry.record_outcome(&result.outcome);
                Some(result)
            }
        }))
        .buffer_unordered(config.workers())
        .filter_map(|result| async move { result })
        .collect()
        .await
    }
}
