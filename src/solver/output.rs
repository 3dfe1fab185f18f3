//! Validation of the solver stdout contract.
//!
//! Line 1 is the integer objective value, interpreted per the algorithm's
//! declared [`SignConvention`]. Line 2, when present and parsable, is the
//! solver-reported elapsed time in milliseconds; its absence is not an error.

use crate::solver::contract::SignConvention;

/// Why a clean-exit stdout could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedStdout {
    pub detail: String,
}

impl std::fmt::Display for MalformedStdout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed solver output: {}", self.detail)
    }
}

impl std::error::Error for MalformedStdout {}

/// Parses the two-line stdout contract, returning the normalized objective
/// value and the optional solver-reported elapsed milliseconds.
pub fn parse_stdout(
    raw: &str,
    sign: SignConvention,
) -> Result<(u64, Option<f64>), MalformedStdout> {
    let mut lines = raw.lines();
    let first = lines.next().map(str::trim).unwrap_or("");
    if first.is_empty() {
        return Err(MalformedStdout {
            detail: "empty stdout".to_string(),
        });
    }
    let parsed: i64 = first.parse().map_err(|_| MalformedStdout {
        detail: format!("first line is not an integer objective: {first:?}"),
    })?;
    let value = match sign {
        SignConvention::NonNegative => {
            if parsed < 0 {
                return Err(MalformedStdout {
                    detail: format!(
                        "objective {parsed} is negative but the contract declares non-negative output"
                    ),
                });
            }
            parsed as u64
        }
        SignConvention::NegatedObjective => parsed.unsigned_abs(),
    };
    let elapsed_ms = lines.next().and_then(|line| line.trim().parse::<f64>().ok());
    Ok((value, elapsed_ms))
}

/// First ~200 characters of stderr, kept for diagnostics on failed runs.
pub fn stderr_excerpt(raw: &str) -> String {
    const EXCERPT_CHARS: usize = 200;
    raw.chars().take(EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_and_elapsed() {
        let (value, elapsed) =
            parse_stdout("128\n9876.5\n", SignConvention::NonNegative).expect("parse");
        assert_eq!(value, 128);
        assert_eq!(elapsed, Some(9876.5));
    }

    #[test]
    fn missing_second_line_is_not_an_error() {
        let (value, elapsed) =
            parse_stdout("42\n", SignConvention::NonNegative).expect("parse");
        assert_eq!(value, 42);
        assert_eq!(elapsed, None);
    }

    #[test]
    fn negated_objective_is_normalized() {
        let (value, _) =
            parse_stdout("-311\n", SignConvention::NegatedObjective).expect("parse");
        assert_eq!(value, 311);
    }

    #[test]
    fn negative_value_under_non_negative_contract_is_malformed() {
        let err = parse_stdout("-311\n", SignConvention::NonNegative).unwrap_err();
        assert!(err.detail.contains("negative"));
    }

    #[test]
    fn empty_and_garbage_stdout_are_malformed() {
        assert!(parse_stdout("", SignConvention::NonNegative).is_err());
        assert!(parse_stdout("best=17\n", SignConvention::NonNegative).is_err());
    }

    #[test]
    fn unparsable_second_line_is_ignored() {
        let (value, elapsed) =
            parse_stdout("17\ndone in 3s\n", SignConvention::NonNegative).expect("parse");
        assert_eq!(value, 17);
        assert_eq!(elapsed, None);
    }

    #[test]
    fn excerpt_is_char_bounded() {
        let long = "x".repeat(500);
        assert_eq!(stderr_excerpt(&long).len(), 200);
        assert_eq!(stderr_excerpt("boom"), "boom");
    }
}
