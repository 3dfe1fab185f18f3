//! Normalized anytime traces.
//!
//! A solver's progress log is plain text, one sample per line, two
//! whitespace-separated fields `value time` (integer objective, float
//! seconds since run start). Lines that do not parse are skipped with a
//! warning; the harness never fails a comparison over one bad line.

use anyhow::{Context, Result};
use std::path::Path;

/// One recorded best-so-far point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnytimeSample {
    /// Seconds since run start, non-negative.
    pub time: f64,
    pub value: i64,
}

/// Time-ordered sequence of samples for one (algorithm, instance) run.
///
/// Times are non-decreasing after construction. Values are not assumed
/// monotone; the harness does not trust that the underlying curve is a
/// best-so-far envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnytimeTrace {
    samples: Vec<AnytimeSample>,
}

impl AnytimeTrace {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses raw log lines. The source ordering is not trusted: samples are
    /// stably sorted by time afterwards.
    pub fn parse(raw: &str) -> Self {
        let mut samples = Vec::new();
        for (number, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let parsed = match (fields.next(), fields.next(), fields.next()) {
                (Some(value), Some(time), None) => value
                    .parse::<i64>()
                    .ok()
                    .zip(time.parse::<f64>().ok())
                    .filter(|(_, time)| time.is_finite() && *time >= 0.0),
                _ => None,
            };
            match parsed {
                Some((value, time)) => samples.push(AnytimeSample { time, value }),
                None => {
                    tracing::warn!(
                        line_number = number + 1,
                        content = line,
                        "skipping unparsable anytime sample"
                    );
                }
            }
        }
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { samples }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read anytime log {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    pub fn samples(&self) -> &[AnytimeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<AnytimeSample> {
        self.samples.first().copied()
    }

    pub fn last(&self) -> Option<AnytimeSample> {
        self.samples.last().copied()
    }

    /// Largest recorded value, regardless of when it occurred.
    pub fn best(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.value).max()
    }
}
