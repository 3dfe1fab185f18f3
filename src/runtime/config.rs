//! Sweep configuration.
//!
//! All instances must be constructed via [`SweepConfig::builder`] or the YAML
//! file form so invariants are validated before any consumer observes the
//! values. There is no process-wide mutable configuration state.

use crate::solver::contract::AlgorithmSpec;
use crate::solver::invoker::DEFAULT_GRACE;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SEED: u64 = 42;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Validated configuration for one benchmark sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    dataset_root: PathBuf,
    output_dir: PathBuf,
    sizes: Vec<u32>,
    densities: Vec<String>,
    replicas: RangeInclusive<u32>,
    time_budget: Duration,
    grace: Duration,
    seed: u64,
    workers: usize,
    record_elapsed: bool,
    algorithms: Vec<AlgorithmSpec>,
}

impl SweepConfig {
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    pub fn dataset_root(&self) -> &Path {
        &self.dataset_root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    pub fn densities(&self) -> &[String] {
        &self.densities
    }

    pub fn replicas(&self) -> RangeInclusive<u32> {
        self.replicas.clone()
    }

    /// Per-run solver time budget (the `-t` value).
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Wall-clock allowance beyond the budget before forced termination.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Worker pool size for concurrent solver invocations.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Whether run tables carry the solver-reported `TIEMPO` column.
    pub fn record_elapsed(&self) -> bool {
        self.record_elapsed
    }

    /// Competing algorithms, in declared (ranking tie-break) order.
    pub fn algorithms(&self) -> &[AlgorithmSpec] {
        &self.algorithms
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset_root.as_os_str().is_empty() {
            bail!("dataset_root is required");
        }
        if self.output_dir.as_os_str().is_empty() {
            bail!("output_dir is required");
        }
        if self.sizes.is_empty() {
            bail!("at least one graph size is required");
        }
        if self.densities.is_empty() {
            bail!("at least one density is required");
        }
        for density in &self.densities {
            if density.trim().is_empty() {
                bail!("density labels cannot be empty");
            }
        }
        if self.replicas.is_empty() {
            bail!("replica range cannot be empty");
        }
        if self.time_budget.is_zero() {
            bail!("time_budget must be greater than 0");
        }
        if self.workers == 0 {
            bail!("workers must be greater than 0");
        }
        if self.algorithms.is_empty() {
            bail!("at least one algorithm is required");
        }
        let mut names = HashSet::new();
        for spec in &self.algorithms {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                bail!("duplicate algorithm name: {}", spec.name);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct SweepConfigBuilder {
    dataset_root: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    sizes: Vec<u32>,
    densities: Vec<String>,
    replicas: Option<RangeInclusive<u32>>,
    time_budget: Option<Duration>,
    grace: Option<Duration>,
    seed: Option<u64>,
    workers: Option<usize>,
    record_elapsed: bool,
    algorithms: Vec<AlgorithmSpec>,
}

impl SweepConfigBuilder {
    pub fn dataset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dataset_root = Some(root.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn sizes(mut self, sizes: impl IntoIterator<Item = u32>) -> Self {
        self.sizes = sizes.into_iter().collect();
        self
    }

    pub fn densities(mut self, densities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.densities = densities.into_iter().map(Into::into).collect();
        self
    }

    pub fn replicas(mut self, replicas: RangeInclusive<u32>) -> Self {
        self.replicas = Some(replicas);
        self
    }

    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = Some(grace);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn record_elapsed(mut self, record: bool) -> Self {
        self.record_elapsed = record;
        self
    }

    pub fn algorithm(mut self, spec: AlgorithmSpec) -> Self {
        self.algorithms.push(spec);
        self
    }

    pub fn algorithms(mut self, specs: impl IntoIterator<Item = AlgorithmSpec>) -> Self {
        self.algorithms.extend(specs);
        self
    }

    pub fn build(self) -> Result<SweepConfig> {
        let config = SweepConfig {
            dataset_root: self.dataset_root.context("dataset_root is required")?,
            output_dir: self.output_dir.context("output_dir is required")?,
            sizes: self.sizes,
            densities: self.densities,
            replicas: self.replicas.context("replica range is required")?,
            time_budget: self.time_budget.context("time_budget is required")?,
            grace: self.grace.unwrap_or(DEFAULT_GRACE),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            workers: self.workers.unwrap_or_else(default_workers),
            record_elapsed: self.record_elapsed,
            algorithms: self.algorithms,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Serde form of a sweep configuration file (YAML).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepFile {
    pub dataset_root: PathBuf,
    pub output_dir: PathBuf,
    pub sizes: Vec<u32>,
    pub densities: Vec<String>,
    pub replicas: ReplicaRange,
    pub time_budget_secs: u64,
    #[serde(default)]
    pub grace_secs: Option<u64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub record_elapsed: bool,
    pub algorithms: Vec<AlgorithmSpec>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReplicaRange {
    pub start: u32,
    pub end: u32,
}

impl SweepFile {
    pub fn load(path: &Path) -> Result<SweepConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sweep config {}", path.display()))?;
        let file: SweepFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse sweep config {}", path.display()))?;
        file.into_config()
    }

    pub fn into_config(self) -> Result<SweepConfig> {
        let mut builder = SweepConfig::builder()
            .dataset_root(self.dataset_root)
            .output_dir(self.output_dir)
            .sizes(self.sizes)
            .densities(self.densities)
            .replicas(self.replicas.start..=self.replicas.end)
            .time_budget(Duration::from_secs(self.time_budget_secs))
            .record_elapsed(self.record_elapsed)
            .algorithms(self.algorithms);
        if let Some(grace) = self.grace_secs {
            builder = builder.grace(Duration::from_secs(grace));
        }
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some(workers) = self.workers {
            builder = builder.workers(workers);
        }
        builder.build()
    }
}
