//! Resampling of anytime traces onto a common time grid.
//!
//! Traces from competing solvers are recorded at independent timestamps, so
//! head-to-head comparison needs an explicit resampling policy: piecewise
//! linear interpolation between the two nearest samples, holding the first
//! value before the first sample and the last value after the last sample
//! (an anytime solver that stopped improving retains its best value).

use crate::trace::anytime::{AnytimeSample, AnytimeTrace};

/// Where the reference time grid comes from. The choice is explicit because
/// different reference grids produce different apparent resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceGrid {
    /// Time coordinates of the contributing trace with the most samples;
    /// ties go to the first declared trace.
    Densest,
    /// Caller-supplied time points, used as given.
    Explicit(Vec<f64>),
}

/// One resampled per-algorithm column.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedColumn {
    pub name: String,
    /// `None` marks a missing value (empty source trace); it is never
    /// interpolated from nothing.
    pub values: Vec<Option<f64>>,
}

/// Pairwise difference column `left - right` at each grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffColumn {
    pub left: String,
    pub right: String,
    pub values: Vec<Option<f64>>,
}

/// Derived comparison table: one row per reference time point, one column per
/// algorithm, plus pairwise differences when more than one trace contributed.
/// Rebuilt per comparison request, never persisted on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonGrid {
    times: Vec<f64>,
    columns: Vec<AlignedColumn>,
    diffs: Vec<DiffColumn>,
    /// Name of the trace that supplied the grid, when one did.
    reference: Option<String>,
}

impl ComparisonGrid {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn columns(&self) -> &[AlignedColumn] {
        &self.columns
    }

    pub fn diffs(&self) -> &[DiffColumn] {
        &self.diffs
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&AlignedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Resamples traces onto a shared reference grid.
#[derive(Debug, Clone)]
pub struct TraceAligner {
    grid: ReferenceGrid,
}

impl Default for TraceAligner {
    fn default() -> Self {
        Self {
            grid: ReferenceGrid::Densest,
        }
    }
}

impl TraceAligner {
    pub fn new(grid: ReferenceGrid) -> Self {
        Self { grid }
    }

    /// Aligns the declared traces. Trace order is meaningful: it fixes the
    /// column order, the densest-grid tie-break, and the diff pairs.
    pub fn align(&self, traces: &[(String, AnytimeTrace)]) -> ComparisonGrid {
        let (times, reference) = match &self.grid {
            ReferenceGrid::Explicit(times) => (times.clone(), None),
            ReferenceGrid::Densest => {
                // strictly greater, so the first declared trace wins ties
                let mut densest: Option<&(String, AnytimeTrace)> = None;
                for entry in traces {
                    if entry.1.len() > densest.map_or(0, |d| d.1.len()) {
                        densest = Some(entry);
                    }
                }
                match densest {
                    Some((name, trace)) => (
                        trace.samples().iter().map(|s| s.time).collect(),
                        Some(name.clone()),
                    ),
                    None => (Vec::new(), None),
                }
            }
        };

        let columns: Vec<AlignedColumn> = traces
            .iter()
            .map(|(name, trace)| AlignedColumn {
                name: name.clone(),
                values: times
                    .iter()
                    .map(|&t| value_at(trace.samples(), t))
                    .collect(),
            })
            .collect();

        let mut diffs = Vec::new();
        for (i, left) in columns.iter().enumerate() {
            for right in columns.iter().skip(i + 1) {
                diffs.push(DiffColumn {
                    left: left.name.clone(),
                    right: right.name.clone(),
                    values: left
                        .values
                        .iter()
                        .zip(&right.values)
                        .map(|(a, b)| match (a, b) {
                            (Some(a), Some(b)) => Some(a - b),
                            _ => None,
                        })
                        .collect(),
                });
            }
        }

        ComparisonGrid {
            times,
            columns,
            diffs,
            reference,
        }
    }
}

/// Value of a trace at query time `t`: exact at recorded sample points,
/// linear between neighbors, flat beyond either end, `None` for an empty
/// trace.
fn value_at(samples: &[AnytimeSample], t: f64) -> Option<f64> {
    let first = samples.first()?;
    let last = samples.last()?;
    if t <= first.time {
        return Some(first.value as f64);
    }
    if t >= last.time {
        return Some(last.value as f64);
    }
    // first index whose time is >= t; bounded by the clamps above
    let upper = samples.partition_point(|s| s.time < t);
    let right = samples[upper];
    if right.time == t {
        return Some(right.value as f64);
    }
    let left = samples[upper - 1];
    let span = right.time - left.time;
    let fraction = (t - left.time) / span;
    Some(left.value as f64 + fraction * (right.value - left.value) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(pairs: &[(i64, f64)]) -> AnytimeTrace {
        let raw: String = pairs
            .iter()
            .map(|(value, time)| format!("{value} {time}\n"))
            .collect();
        AnytimeTrace::parse(&raw)
    }

    #[test]
    fn resampling_onto_own_grid_is_exact() {
        let sa = trace(&[(100, 0.5), (110, 2.0), (125, 7.5)]);
        let grid = TraceAligner::new(ReferenceGrid::Explicit(vec![0.5, 2.0, 7.5]))
            .align(&[("sa".to_string(), sa)]);
        assert_eq!(
            grid.column("sa").expect("column").values,
            vec![Some(100.0), Some(110.0), Some(125.0)]
        );
    }

    #[test]
    fn interpolation_is_linear_between_neighbors() {
        let sa = trace(&[(100, 0.0), (200, 10.0)]);
        let grid = TraceAligner::new(ReferenceGrid::Explicit(vec![2.5, 5.0]))
            .align(&[("sa".to_string(), sa)]);
        assert_eq!(
            grid.column("sa").expect("column").values,
            vec![Some(125.0), Some(150.0)]
        );
    }

    #[test]
    fn extrapolation_is_flat_on_both_ends() {
        let sa = trace(&[(100, 1.0), (140, 5.0)]);
        let grid = TraceAligner::new(ReferenceGrid::Explicit(vec![0.0, 100.0]))
            .align(&[("sa".to_string(), sa)]);
        assert_eq!(
            grid.column("sa").expect("column").values,
            vec![Some(100.0), Some(140.0)]
        );
    }

    #[test]
    fn densest_trace_supplies_the_grid_with_first_declared_tiebreak() {
        let sa = trace(&[(100, 0.0), (110, 4.0)]);
        let brkga = trace(&[(90, 1.0), (120, 2.0), (130, 3.0)]);
        let grid = TraceAligner::default().align(&[
            ("sa".to_string(), sa.clone()),
            ("brkga".to_string(), brkga),
        ]);
        assert_eq!(grid.reference(), Some("brkga"));
        assert_eq!(grid.times(), &[1.0, 2.0, 3.0]);

        let tied = trace(&[(50, 0.0), (60, 9.0)]);
        let grid = TraceAligner::default()
            .align(&[("sa".to_string(), sa), ("other".to_string(), tied)]);
        assert_eq!(grid.reference(), Some("sa"));
    }

    #[test]
    fn empty_trace_yields_all_missing_column() {
        let brkga = trace(&[(90, 1.0), (120, 2.0)]);
        let grid = TraceAligner::default().align(&[
            ("brkga".to_string(), brkga),
            ("sa".to_string(), AnytimeTrace::empty()),
        ]);
        assert_eq!(grid.column("sa").expect("column").values, vec![None, None]);
        // diffs involving the missing column are missing too
        assert_eq!(grid.diffs()[0].values, vec![None, None]);
    }

    #[test]
    fn pairwise_diffs_cover_every_declared_pair() {
        let a = trace(&[(10, 0.0), (20, 2.0)]);
        let b = trace(&[(5, 0.0), (10, 2.0)]);
        let c = trace(&[(1, 0.0), (2, 2.0)]);
        let grid = TraceAligner::new(ReferenceGrid::Explicit(vec![0.0, 2.0])).align(&[
            ("a".to_string(), a),
            ("b".to_string(), b),
            ("c".to_string(), c),
        ]);
        let pairs: Vec<_> = grid
            .diffs()
            .iter()
            .map(|d| (d.left.as_str(), d.right.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert_eq!(grid.diffs()[0].values, vec![Some(5.0), Some(10.0)]);
    }

    #[test]
    fn no_contributing_samples_means_empty_grid() {
        let grid = TraceAligner::default().align(&[("sa".to_string(), AnytimeTrace::empty())]);
        assert!(grid.times().is_empty());
        assert_eq!(grid.reference(), None);
    }
}
