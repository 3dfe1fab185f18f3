pub mod aggregate;
pub mod catalog;
pub mod registry;
pub mod report;
pub mod runtime;
pub mod solver;
pub mod trace;

pub use aggregate::{rank, summarize, GroupBy, GroupSummary, Observation};
pub use catalog::{Instance, InstanceCatalog};
pub use registry::{RegistryError, RunOutcome, RunRegistry, RunRequest, RunResult, RunRow};
pub use runtime::config::{SweepConfig, SweepConfigBuilder, SweepFile};
pub use runtime::runner::{Runner, SweepOutcome};
pub use runtime::sweep::Sweep;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use solver::{AlgorithmSpec, FlagContract, ParamSet, SignConvention, SolverInvoker};
pub use trace::{AnytimeSample, AnytimeTrace, ComparisonGrid, ReferenceGrid, TraceAligner};
