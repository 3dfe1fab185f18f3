//! Descriptive statistics and rankings over run results.
//!
//! Groups are keyed by any subset of (algorithm, size, density). Only
//! successful runs contribute; a group with no successes produces no row at
//! all, so downstream consumers can never mistake "no data" for "value 0".

use crate::registry::{RunOutcome, RunResult};

/// One successful measurement, detached from process bookkeeping so the same
/// aggregation path serves both live sweeps and persisted tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub algorithm: String,
    pub size: Option<u32>,
    pub density: String,
    pub value: u64,
}

impl Observation {
    /// Extracts an observation from a run result; failures yield `None`.
    pub fn from_result(result: &RunResult) -> Option<Self> {
        match result.outcome {
            RunOutcome::Success { value, .. } => Some(Self {
                algorithm: result.request.algorithm.name.clone(),
                size: Some(result.request.instance.size),
                density: result.request.instance.density.clone(),
                value,
            }),
            _ => None,
        }
    }
}

/// Which key components participate in grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBy {
    pub algorithm: bool,
    pub size: bool,
    pub density: bool,
}

impl GroupBy {
    pub const FULL: Self = Self {
        algorithm: true,
        size: true,
        density: true,
    };

    pub const DENSITY: Self = Self {
        algorithm: false,
        size: false,
        density: true,
    };

    pub const ALGORITHM_SIZE: Self = Self {
        algorithm: true,
        size: true,
        density: false,
    };
}

/// Summary statistics for one non-empty group. `stdev` uses the sample
/// (n − 1) denominator and is 0 when n == 1.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub algorithm: Option<String>,
    pub size: Option<u32>,
    pub density: Option<String>,
    pub mean: f64,
    pub stdev: f64,
    pub min: u64,
    pub max: u64,
    pub n: usize,
}

type Key = (Option<String>, Option<u32>, Option<String>);

fn project(observation: &Observation, by: GroupBy) -> Key {
    (
        by.algorithm.then(|| observation.algorithm.clone()),
        if by.size { observation.size } else { None },
        by.density.then(|| observation.density.clone()),
    )
}

/// Groups observations and computes per-group statistics.
///
/// Group order follows first appearance in the input (the sweep feeds
/// observations in declared algorithm order, which is what the ranking
/// tie-break relies on). The statistics themselves are order-independent:
/// mean and stdev are derived from exact integer sums.
pub fn summarize(observations: &[Observation], by: GroupBy) -> Vec<GroupSummary> {
    let mut groups: Vec<(Key, Vec<u64>)> = Vec::new();
    for observation in observations {
        let key = project(observation, by);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(observation.value),
            None => groups.push((key, vec![observation.value])),
        }
    }

    groups
        .into_iter()
        .map(|((algorithm, size, density), values)| {
            let n = values.len();
            let sum: u128 = values.iter().map(|&v| v as u128).sum();
            let sum_sq: u128 = values.iter().map(|&v| (v as u128) * (v as u128)).sum();
            let mean = sum as f64 / n as f64;
            let stdev = if n > 1 {
                let numerator = (n as u128) * sum_sq - sum * sum;
                let denominator = (n as u128) * (n as u128 - 1);
                (numerator as f64 / denominator as f64).sqrt()
            } else {
                0.0
            };
            GroupSummary {
                algorithm,
                size,
                density,
                mean,
                stdev,
                min: values.iter().copied().min().unwrap_or(0),
                max: values.iter().copied().max().unwrap_or(0),
                n,
            }
        })
        .collect()
}

/// Ranks summaries by mean value descending. The sort is stable, so groups
/// with equal means keep their declared order (first-declared wins ties).
/// Cross-size and cross-density rank tables are this view applied to a
/// filtered slice; nothing is recomputed.
pub fn rank(summaries: &[GroupSummary]) -> Vec<(usize, &GroupSummary)> {
    let mut ordered: Vec<&GroupSummary> = summaries.iter().collect();
    ordered.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, summary)| (index + 1, summary))
        .collect()
}
