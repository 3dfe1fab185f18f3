//! Run bookkeeping: one immutable [`RunResult`] per attempted invocation,
//! owned by a [`RunRegistry`] that persists the numeric run table and loads
//! it back with schema validation.

use crate::catalog::Instance;
use crate::solver::contract::AlgorithmSpec;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One attempted solver invocation. Immutable; exactly one [`RunResult`] is
/// produced per request.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub instance: Instance,
    pub algorithm: Arc<AlgorithmSpec>,
    pub time_budget: Duration,
    pub seed: u64,
}

/// Outcome taxonomy for a single run. Failures are data, not exceptions:
/// the aggregator and report layer pattern-match on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success {
        value: u64,
        /// Solver-reported elapsed milliseconds (stdout line 2), if any.
        elapsed_ms: Option<f64>,
    },
    /// Exceeded `time_budget + grace`; the process group was terminated.
    Timeout,
    NonZeroExit {
        code: Option<i32>,
        stderr_excerpt: String,
    },
    /// Clean exit but stdout did not satisfy the output contract.
    MalformedOutput { detail: String },
    /// Input file absent; no process was spawned.
    MissingInput,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Success { .. } => "success",
            RunOutcome::Timeout => "timeout",
            RunOutcome::NonZeroExit { .. } => "non_zero_exit",
            RunOutcome::MalformedOutput { .. } => "malformed_output",
            RunOutcome::MissingInput => "missing_input",
        }
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            RunOutcome::Success { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Immutable record of one attempted run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub request: RunRequest,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Success { .. })
    }
}

/// One data row of a persisted run table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub density: String,
    pub instance: u32,
    pub value: u64,
    pub elapsed_ms: Option<f64>,
}

/// Errors surfaced by registry persistence. A schema mismatch is fatal for
/// that load operation only; the sweep itself keeps going.
#[derive(Debug)]
pub enum RegistryError {
    SchemaMismatch { expected: String, found: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::SchemaMismatch { expected, found } => write!(
                f,
                "run table schema mismatch: expected columns [{expected}], found [{found}]"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Owns the set of [`RunResult`]s for one (size, algorithm) slice of a sweep.
///
/// `flush` always rewrites the whole file so regenerating the table is
/// idempotent; nothing ever appends. Only `Success` outcomes contribute rows
/// to the numeric table; failures live in the logs and telemetry.
#[derive(Debug)]
pub struct RunRegistry {
    with_elapsed: bool,
    results: Vec<RunResult>,
}

impl RunRegistry {
    /// `with_elapsed` fixes the column set: `DENSITY,INSTANCE,VALOR` plus
    /// `TIEMPO` when true. The column set of a file never varies row to row.
    pub fn new(with_elapsed: bool) -> Self {
        Self {
            with_elapsed,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: RunResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    fn header(with_elapsed: bool) -> Vec<&'static str> {
        if with_elapsed {
            vec!["DENSITY", "INSTANCE", "VALOR", "TIEMPO"]
        } else {
            vec!["DENSITY", "INSTANCE", "VALOR"]
        }
    }

    /// Successful runs as sorted table rows, deterministic in
    /// (density, replica) order regardless of completion order.
    fn rows(&self) -> Vec<RunRow> {
        let mut rows: Vec<RunRow> = self
            .results
            .iter()
            .filter_map(|result| match &result.outcome {
                RunOutcome::Success { value, elapsed_ms } => Some(RunRow {
                    density: result.request.instance.density.clone(),
                    instance: result.request.instance.replica,
                    value: *value,
                    elapsed_ms: *elapsed_ms,
                }),
                _ => None,
            })
            .collect();
        rows.sort_by(|a, b| (&a.density, a.instance).cmp(&(&b.density, b.instance)));
        rows
    }

    /// Rewrites the run table at `path` from scratch. The header is always
    /// written, even when there are no successful runs, so downstream tooling
    /// never reads an absent file.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to open run table {}", path.display()))?;
        writer.write_record(Self::header(self.with_elapsed))?;
        for row in self.rows() {
            if self.with_elapsed {
                writer.write_record([
                    row.density.as_str(),
                    &row.instance.to_string(),
                    &row.value.to_string(),
                    &row.elapsed_ms.map(|t| t.to_string()).unwrap_or_default(),
                ])?;
            } else {
                writer.write_record([
                    row.density.as_str(),
                    &row.instance.to_string(),
                    &row.value.to_string(),
                ])?;
            }
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush run table {}", path.display()))?;
        Ok(())
    }

    /// Loads a persisted run table, rejecting files whose column set does not
    /// match `with_elapsed` with [`RegistryError::SchemaMismatch`].
    pub fn load(path: &Path, with_elapsed: bool) -> Result<Vec<RunRow>> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open run table {}", path.display()))?;
        let expected = Self::header(with_elapsed);
        let found: Vec<String> = reader
            .headers()
            .context("run table has no header row")?
            .iter()
            .map(|s| s.to_string())
            .collect();
        if found != expected {
            return Err(RegistryError::SchemaMismatch {
                expected: expected.join(","),
                found: found.join(","),
            }
            .into());
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("failed to read row {} of {}", index + 1, path.display()))?;
            let density = record.get(0).unwrap_or_default().to_string();
            let instance: u32 = record
                .get(1)
                .unwrap_or_default()
                .parse()
                .with_context(|| format!("row {}: INSTANCE is not an integer", index + 1))?;
            let value: u64 = record
                .get(2)
                .unwrap_or_default()
                .parse()
                .with_context(|| format!("row {}: VALOR is not an integer", index + 1))?;
            let elapsed_ms = if with_elapsed {
                let field = record.get(3).unwrap_or_default().trim();
                if field.is_empty() {
                    None
                } else {
                    Some(field.parse().with_context(|| {
                        format!("row {}: TIEMPO is not a number", index + 1)
                    })?)
                }
            } else {
                None
            };
            rows.push(RunRow {
                density,
                instance,
                value,
                elapsed_ms,
            });
        }
        Ok(rows)
    }
}
