//! Declared invocation and output contracts for the competing solvers.
//!
//! Every algorithm states up front which command-line flags its binary
//! accepts and how its first output line encodes the objective value. The
//! harness never guesses: flags the contract does not declare are never
//! passed, and sign handling follows the declared convention instead of a
//! blanket `abs()`.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the solver reports the (maximization) objective on stdout line 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// The value is reported as-is; a negative value is a malformed output,
    /// never silently rectified.
    NonNegative,
    /// The binary frames the objective as a minimization and prints it
    /// negated; the harness stores the absolute value.
    NegatedObjective,
}

/// Which flags the solver binary accepts. `-i <path>` is always passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagContract {
    /// `-t <seconds>` internal time budget.
    pub time_budget: bool,
    /// `-seed <int>`.
    pub seed: bool,
    /// BRKGA population flags: `-p`, `-pe`, `-pm`, `-rhoe`.
    pub population: bool,
}

impl Default for FlagContract {
    fn default() -> Self {
        Self {
            time_budget: true,
            seed: true,
            population: false,
        }
    }
}

impl FlagContract {
    /// Deterministic greedy: takes only the input path.
    pub fn input_only() -> Self {
        Self {
            time_budget: false,
            seed: false,
            population: false,
        }
    }

    /// Full BRKGA flag set.
    pub fn full() -> Self {
        Self {
            time_budget: true,
            seed: true,
            population: true,
        }
    }
}

/// Algorithm-specific tuning parameters. Only flags the [`FlagContract`]
/// declares are ever emitted, so a partially filled set is fine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ParamSet {
    pub population: Option<u32>,
    pub elite_fraction: Option<f64>,
    pub mutant_fraction: Option<f64>,
    pub inheritance: Option<f64>,
}

impl ParamSet {
    pub fn validate(&self) -> Result<()> {
        if let Some(population) = self.population {
            if population == 0 {
                bail!("population must be greater than 0");
            }
        }
        for (name, fraction) in [
            ("elite_fraction", self.elite_fraction),
            ("mutant_fraction", self.mutant_fraction),
            ("inheritance", self.inheritance),
        ] {
            if let Some(value) = fraction {
                if !(0.0..=1.0).contains(&value) {
                    bail!("{name} must be within [0, 1], got {value}");
                }
            }
        }
        Ok(())
    }
}

/// The complete declared contract for one competing algorithm.
#[derive(Debug, Clone, Deserialize)]
pub struct AlgorithmSpec {
    pub name: String,
    pub binary: PathBuf,
    #[serde(default)]
    pub flags: FlagContract,
    pub sign: SignConvention,
    #[serde(default)]
    pub params: ParamSet,
}

impl AlgorithmSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("algorithm name cannot be empty");
        }
        if self.binary.as_os_str().is_empty() {
            bail!("algorithm {} has no binary path", self.name);
        }
        self.params.validate()
    }

    /// Builds the argument vector for one invocation according to the
    /// declared flag contract.
    pub fn command_args(&self, input: &Path, time_budget: Duration, seed: u64) -> Vec<String> {
        let mut args = vec!["-i".to_string(), input.display().to_string()];
        if self.flags.time_budget {
            args.push("-t".to_string());
            args.push(time_budget.as_secs().to_string());
        }
        if self.flags.population {
            if let Some(population) = self.params.population {
                args.push("-p".to_string());
                args.push(population.to_string());
            }
            if let Some(elite) = self.params.elite_fraction {
                args.push("-pe".to_string());
                args.push(elite.to_string());
            }
            if let Some(mutants) = self.params.mutant_fraction {
                args.push("-pm".to_string());
                args.push(mutants.to_string());
            }
            if let Some(rhoe) = self.params.inheritance {
                args.push("-rhoe".to_string());
                args.push(rhoe.to_string());
            }
        }
        if self.flags.seed {
            args.push("-seed".to_string());
            args.push(seed.to_string());
        }
        args
    }
}
