//! Tabular export boundary: serializes summaries and comparison grids to CSV
//! for the downstream plotting/reporting layer. Every writer rewrites its
//! file from scratch and always emits the header, so a consumer never reads
//! a partial or absent table.

use crate::aggregate::GroupSummary;
use crate::trace::align::ComparisonGrid;
use anyhow::{Context, Result};
use std::path::Path;

/// Writes the per-density summary table: `DENSITY,MEDIA_CALIDAD,STD_CALIDAD`.
pub fn write_summaries(path: &Path, summaries: &[GroupSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open summary table {}", path.display()))?;
    writer.write_record(["DENSITY", "MEDIA_CALIDAD", "STD_CALIDAD"])?;
    for summary in summaries {
        writer.write_record([
            summary.density.clone().unwrap_or_default(),
            summary.mean.to_string(),
            summary.stdev.to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush summary table {}", path.display()))?;
    Ok(())
}

/// Writes an aligned comparison grid: one row per reference time point, one
/// column per algorithm, then the pairwise difference columns. Missing values
/// become empty cells.
pub fn write_comparison(path: &Path, grid: &ComparisonGrid) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open comparison table {}", path.display()))?;

    let mut header = vec!["TIEMPO".to_string()];
    header.extend(grid.columns().iter().map(|c| c.name.clone()));
    header.extend(
        grid.diffs()
            .iter()
            .map(|d| format!("{}-{}", d.left, d.right)),
    );
    writer.write_record(&header)?;

    for (row, &time) in grid.times().iter().enumerate() {
        let mut record = vec![time.to_string()];
        for column in grid.columns() {
            record.push(cell(column.values[row]));
        }
        for diff in grid.diffs() {
            record.push(cell(diff.values[row]));
        }
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush comparison table {}", path.display()))?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
